//! # 申請
//!
//! 申請種別から作成された申請の実体を管理する。
//! フォームデータと進捗状態を保持し、承認・却下・取り消しのライフサイクルを持つ。
//!
//! 状態遷移は ADT（代数的データ型）で表現し、不正な状態を型レベルで防止する。
//! 共通フィールドを外側に、状態固有フィールドを `state` enum に分離する。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use strum::IntoStaticStr;

use super::{request_type::RequestTypeId, workflow::{WorkflowId, WorkflowStepId}};
use crate::{
    DomainError,
    user::UserId,
    value_objects::{Priority, RequestTitle, Version},
};

define_uuid_id! {
    /// 申請 ID
    pub struct RequestId;
}

/// 申請ステータス
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    /// 下書き
    Draft,
    /// 承認待ち（作成直後の状態。ワークフローの最初のステップを指す）
    Pending,
    /// 処理中（2 ステップ目以降に進んだ状態）
    InProgress,
    /// 承認完了
    Approved,
    /// 却下
    Rejected,
    /// 取り消し
    Cancelled,
}

impl std::str::FromStr for RequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::Validation(format!(
                "不正な申請ステータス: {}",
                s
            ))),
        }
    }
}

/// 申請の状態（ADT ベースステートマシン）
///
/// 各状態で有効なフィールドのみを持たせることで、不正な状態を型レベルで防止する。
/// - 非終端状態の現在ステップは高々 1 つ
/// - 終端状態（Approved / Rejected / Cancelled）は完了時刻を持ち、
///   ステップポインタは凍結される
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// 下書き（エンジンは生成しない。過去データとの互換用）
    Draft,
    /// 承認待ち
    Pending(PendingState),
    /// 処理中
    InProgress(InProgressState),
    /// 承認完了
    Approved(CompletedState),
    /// 却下
    Rejected(CompletedState),
    /// 取り消し
    Cancelled(CancelledState),
}

/// Pending 状態の固有フィールド
///
/// ワークフローなしで作成された申請は `current_step_id` が None のまま
/// Pending に留まる（承認レコードが作られないため遷移経路を持たない）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingState {
    /// 現在のステップ ID（ワークフローがある場合は最初のステップ）
    pub current_step_id: Option<WorkflowStepId>,
}

/// InProgress 状態の固有フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InProgressState {
    /// 現在のステップ ID
    pub current_step_id: WorkflowStepId,
}

/// Approved / Rejected 共通の完了状態フィールド
///
/// 両方とも承認ステップを持つ状態からのみ遷移可能。
/// `last_step_id` は最後に処理されたステップを指したまま凍結される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedState {
    /// 最後に処理されたステップ ID
    pub last_step_id: WorkflowStepId,
    /// 完了日時
    pub completed_at: DateTime<Utc>,
}

/// Cancelled 状態の固有フィールド
///
/// Pending / InProgress から遷移可能。
/// 前状態に依存するフィールドは Option で表現する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelledState {
    /// 取り消し時点のステップ ID（ワークフローなしの申請では None）
    pub current_step_id: Option<WorkflowStepId>,
    /// 取り消し日時
    pub completed_at:    DateTime<Utc>,
}

/// 申請エンティティ
///
/// 申請種別から作成された申請の実体。フォームデータと進捗状態を保持する。
///
/// ## 楽観的ロック
///
/// `version` フィールドにより、並行更新時の競合を検出する。
/// 2 人の承認者が同じステップを同時に処理した場合、後勝ちではなく
/// 後からの更新が競合エラー（409 Conflict）になる。
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    id: RequestId,
    request_type_id: RequestTypeId,
    workflow_id: Option<WorkflowId>,
    title: RequestTitle,
    form_data: JsonValue,
    priority: Priority,
    due_date: Option<NaiveDate>,
    version: Version,
    requester_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    state: RequestState,
}

/// 申請の新規作成パラメータ
pub struct NewRequest {
    pub id: RequestId,
    pub request_type_id: RequestTypeId,
    pub workflow_id: Option<WorkflowId>,
    pub first_step_id: Option<WorkflowStepId>,
    pub title: RequestTitle,
    pub form_data: JsonValue,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub requester_id: UserId,
    pub now: DateTime<Utc>,
}

/// 申請の DB 復元パラメータ
///
/// DB スキーマのフラット構造を表現する。`from_db()` で不変条件を検証して
/// ADT に変換する。
pub struct RequestRecord {
    pub id: RequestId,
    pub request_type_id: RequestTypeId,
    pub workflow_id: Option<WorkflowId>,
    pub title: RequestTitle,
    pub form_data: JsonValue,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub status: RequestStatus,
    pub version: Version,
    pub current_step_id: Option<WorkflowStepId>,
    pub requester_id: UserId,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Request {
    /// 新しい申請を作成する
    ///
    /// ステータスは呼び出し側の指定にかかわらず Pending で固定される
    /// （作成時の正規の初期状態）。ワークフローがある場合は最初のステップを
    /// 現在ステップとして保持する。
    pub fn new(params: NewRequest) -> Self {
        Self {
            id: params.id,
            request_type_id: params.request_type_id,
            workflow_id: params.workflow_id,
            title: params.title,
            form_data: params.form_data,
            priority: params.priority,
            due_date: params.due_date,
            version: Version::initial(),
            requester_id: params.requester_id,
            created_at: params.now,
            updated_at: params.now,
            state: RequestState::Pending(PendingState {
                current_step_id: params.first_step_id,
            }),
        }
    }

    /// 既存のデータから復元する
    ///
    /// DB のフラット構造から ADT に変換し、不変条件を検証する。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 不変条件違反
    ///   （例: InProgress で current_step_id が NULL、
    ///   ワークフローなしでステップポインタを持つ）
    pub fn from_db(record: RequestRecord) -> Result<Self, DomainError> {
        if record.current_step_id.is_some() && record.workflow_id.is_none() {
            return Err(DomainError::Validation(
                "ワークフローを持たない申請はステップを参照できません".to_string(),
            ));
        }

        let state = match record.status {
            RequestStatus::Draft => RequestState::Draft,
            RequestStatus::Pending => RequestState::Pending(PendingState {
                current_step_id: record.current_step_id,
            }),
            RequestStatus::InProgress => {
                let current_step_id = record.current_step_id.ok_or_else(|| {
                    DomainError::Validation(
                        "InProgress の申請には current_step_id が必要です".to_string(),
                    )
                })?;
                RequestState::InProgress(InProgressState { current_step_id })
            }
            RequestStatus::Approved => {
                RequestState::Approved(Self::completed_state_from(&record, "Approved")?)
            }
            RequestStatus::Rejected => {
                RequestState::Rejected(Self::completed_state_from(&record, "Rejected")?)
            }
            RequestStatus::Cancelled => {
                let completed_at = record.completed_at.ok_or_else(|| {
                    DomainError::Validation(
                        "Cancelled の申請には completed_at が必要です".to_string(),
                    )
                })?;
                RequestState::Cancelled(CancelledState {
                    current_step_id: record.current_step_id,
                    completed_at,
                })
            }
        };

        Ok(Self {
            id: record.id,
            request_type_id: record.request_type_id,
            workflow_id: record.workflow_id,
            title: record.title,
            form_data: record.form_data,
            priority: record.priority,
            due_date: record.due_date,
            version: record.version,
            requester_id: record.requester_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            state,
        })
    }

    fn completed_state_from(
        record: &RequestRecord,
        status_name: &str,
    ) -> Result<CompletedState, DomainError> {
        let last_step_id = record.current_step_id.clone().ok_or_else(|| {
            DomainError::Validation(format!(
                "{} の申請には current_step_id が必要です",
                status_name
            ))
        })?;
        let completed_at = record.completed_at.ok_or_else(|| {
            DomainError::Validation(format!(
                "{} の申請には completed_at が必要です",
                status_name
            ))
        })?;
        Ok(CompletedState {
            last_step_id,
            completed_at,
        })
    }

    // Getter メソッド

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn request_type_id(&self) -> &RequestTypeId {
        &self.request_type_id
    }

    pub fn workflow_id(&self) -> Option<&WorkflowId> {
        self.workflow_id.as_ref()
    }

    pub fn title(&self) -> &RequestTitle {
        &self.title
    }

    pub fn form_data(&self) -> &JsonValue {
        &self.form_data
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn requester_id(&self) -> &UserId {
        &self.requester_id
    }

    pub fn status(&self) -> RequestStatus {
        match &self.state {
            RequestState::Draft => RequestStatus::Draft,
            RequestState::Pending(_) => RequestStatus::Pending,
            RequestState::InProgress(_) => RequestStatus::InProgress,
            RequestState::Approved(_) => RequestStatus::Approved,
            RequestState::Rejected(_) => RequestStatus::Rejected,
            RequestState::Cancelled(_) => RequestStatus::Cancelled,
        }
    }

    pub fn current_step_id(&self) -> Option<&WorkflowStepId> {
        match &self.state {
            RequestState::Draft => None,
            RequestState::Pending(s) => s.current_step_id.as_ref(),
            RequestState::InProgress(s) => Some(&s.current_step_id),
            RequestState::Approved(s) | RequestState::Rejected(s) => Some(&s.last_step_id),
            RequestState::Cancelled(s) => s.current_step_id.as_ref(),
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            RequestState::Approved(s) | RequestState::Rejected(s) => Some(s.completed_at),
            RequestState::Cancelled(s) => Some(s.completed_at),
            _ => None,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 状態への直接アクセス（パターンマッチ用）
    pub fn state(&self) -> &RequestState {
        &self.state
    }

    /// 終端状態（Approved / Rejected / Cancelled）かどうか
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            RequestState::Approved(_) | RequestState::Rejected(_) | RequestState::Cancelled(_)
        )
    }

    // ビジネスロジックメソッド

    /// アクティブなステップ ID を取り出す
    ///
    /// 承認・却下の処理対象となるステップを持つ状態
    /// （Pending でステップあり、または InProgress）でのみ Some を返す。
    pub fn active_step_id(&self) -> Option<&WorkflowStepId> {
        match &self.state {
            RequestState::Pending(s) => s.current_step_id.as_ref(),
            RequestState::InProgress(s) => Some(&s.current_step_id),
            _ => None,
        }
    }

    /// 次の承認ステップに遷移した新しいインスタンスを返す
    ///
    /// Pending（ステップあり）または InProgress の申請の現在ステップを
    /// 次のステップに更新し、InProgress にする。
    /// version をインクリメントして楽観的ロックに対応。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: アクティブなステップを持たない状態で
    ///   呼び出した場合
    pub fn advanced_to(
        self,
        next_step_id: WorkflowStepId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        match &self.state {
            RequestState::Pending(PendingState {
                current_step_id: Some(_),
            })
            | RequestState::InProgress(_) => Ok(Self {
                state: RequestState::InProgress(InProgressState {
                    current_step_id: next_step_id,
                }),
                version: self.version.next(),
                updated_at: now,
                ..self
            }),
            _ => Err(DomainError::Validation(format!(
                "次ステップ遷移はアクティブなステップを持つ申請でのみ可能です（現在: {}）",
                self.status()
            ))),
        }
    }

    /// 最終ステップ承認による完了処理
    ///
    /// 申請を Approved に遷移させる。ステップポインタは最後のステップを
    /// 指したまま凍結される。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: アクティブなステップを持たない状態で
    ///   呼び出した場合
    pub fn completed_with_approval(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let Some(step_id) = self.active_step_id().cloned() else {
            return Err(DomainError::Validation(format!(
                "承認完了はアクティブなステップを持つ申請でのみ可能です（現在: {}）",
                self.status()
            )));
        };
        Ok(Self {
            state: RequestState::Approved(CompletedState {
                last_step_id: step_id,
                completed_at: now,
            }),
            version: self.version.next(),
            updated_at: now,
            ..self
        })
    }

    /// ステップ却下による完了処理
    ///
    /// 申請を Rejected に遷移させる（以降のステップは実行されない）。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: アクティブなステップを持たない状態で
    ///   呼び出した場合
    pub fn completed_with_rejection(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let Some(step_id) = self.active_step_id().cloned() else {
            return Err(DomainError::Validation(format!(
                "却下完了はアクティブなステップを持つ申請でのみ可能です（現在: {}）",
                self.status()
            )));
        };
        Ok(Self {
            state: RequestState::Rejected(CompletedState {
                last_step_id: step_id,
                completed_at: now,
            }),
            version: self.version.next(),
            updated_at: now,
            ..self
        })
    }

    /// 申請を取り消した新しいインスタンスを返す
    ///
    /// Pending / InProgress からのみ遷移可能。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 終端状態または下書きで呼び出した場合
    pub fn cancelled(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.state {
            RequestState::Pending(pending) => Ok(Self {
                state: RequestState::Cancelled(CancelledState {
                    current_step_id: pending.current_step_id,
                    completed_at:    now,
                }),
                version: self.version.next(),
                updated_at: now,
                ..self
            }),
            RequestState::InProgress(in_progress) => Ok(Self {
                state: RequestState::Cancelled(CancelledState {
                    current_step_id: Some(in_progress.current_step_id),
                    completed_at:    now,
                }),
                version: self.version.next(),
                updated_at: now,
                ..self
            }),
            RequestState::Draft
            | RequestState::Approved(_)
            | RequestState::Rejected(_)
            | RequestState::Cancelled(_) => Err(DomainError::Validation(
                "承認待ちまたは処理中の申請のみ取り消せます".to_string(),
            )),
        }
    }
}
