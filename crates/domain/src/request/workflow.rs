//! # ワークフロー定義
//!
//! 承認手順のテンプレートを管理する。
//! ワークフローは順序付きの承認ステップ列を持ち、申請種別の既定ワークフロー
//! として参照される。進行中の申請から参照されたステップは変更不可
//! （バージョニングなし）。

use chrono::{DateTime, Utc};
use strum::IntoStaticStr;
use uuid::Uuid;

use crate::{
    DomainError,
    role::{DepartmentId, RoleId},
    user::UserId,
    value_objects::{StepOrder, WorkflowName},
};

define_uuid_id! {
    /// ワークフロー ID
    pub struct WorkflowId;
}

define_uuid_id! {
    /// ワークフローステップ ID
    pub struct WorkflowStepId;
}

/// ステップ種別
///
/// - `Decision`: 判断ステップ。承認で次へ進み、却下で申請全体が却下される
/// - `Opinion`: 意見ステップ。結果にかかわらず次へ進む（意見は参考情報で
///   あり、フローを堰き止めない）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StepType {
    /// 判断（承認/却下がフローを制御する）
    Decision,
    /// 意見（結果にかかわらず次へ進む）
    Opinion,
}

impl std::str::FromStr for StepType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "decision" => Ok(Self::Decision),
            "opinion" => Ok(Self::Opinion),
            _ => Err(DomainError::Validation(format!(
                "不正なステップ種別: {}",
                s
            ))),
        }
    }
}

/// ステップの担当者指定
///
/// 明示的なタグ付きユニオンで表現し、解決処理に網羅的な match を強制する。
/// `Department` は解決パスが存在しないため、解決時に明示的なエラーになる
/// （ランタイムのデフォルト分岐で握りつぶさない）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApproverSpec {
    /// 特定ユーザー 1 名
    User(UserId),
    /// ロール保持者全員（解決時点のスナップショット）
    Role(RoleId),
    /// 部署（解決パス未実装）
    Department(DepartmentId),
}

impl ApproverSpec {
    /// DB の (approver_type, approver_id) ペアから復元する
    pub fn from_db(approver_type: &str, approver_id: Uuid) -> Result<Self, DomainError> {
        match approver_type {
            "user" => Ok(Self::User(UserId::from_uuid(approver_id))),
            "role" => Ok(Self::Role(RoleId::from_uuid(approver_id))),
            "department" => Ok(Self::Department(DepartmentId::from_uuid(approver_id))),
            _ => Err(DomainError::Validation(format!(
                "不正な担当者種別: {}",
                approver_type
            ))),
        }
    }

    /// DB 格納用の種別文字列を返す
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Role(_) => "role",
            Self::Department(_) => "department",
        }
    }

    /// DB 格納用の UUID を返す
    pub fn approver_uuid(&self) -> &Uuid {
        match self {
            Self::User(id) => id.as_uuid(),
            Self::Role(id) => id.as_uuid(),
            Self::Department(id) => id.as_uuid(),
        }
    }
}

/// ワークフローエンティティ
///
/// 承認手順のテンプレート。ステップは別エンティティ（[`WorkflowStep`]）として
/// step_order 順に取得する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    id:         WorkflowId,
    name:       WorkflowName,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Workflow {
    /// 新しいワークフローを作成する
    pub fn new(id: WorkflowId, name: WorkflowName, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            created_at: now,
            updated_at: now,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(
        id: WorkflowId,
        name: WorkflowName,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn name(&self) -> &WorkflowName {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// ワークフローステップエンティティ
///
/// ワークフロー内の個々の承認ステップ。step_order はワークフロー内で一意な
/// 昇順。「次のステップ」は現在の step_order より大きい最小のものを指す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStep {
    id:          WorkflowStepId,
    workflow_id: WorkflowId,
    step_order:  StepOrder,
    step_name:   String,
    step_type:   StepType,
    approver:    ApproverSpec,
    is_required: bool,
    created_at:  DateTime<Utc>,
}

/// ワークフローステップの新規作成パラメータ
pub struct NewWorkflowStep {
    pub id:          WorkflowStepId,
    pub workflow_id: WorkflowId,
    pub step_order:  StepOrder,
    pub step_name:   String,
    pub step_type:   StepType,
    pub approver:    ApproverSpec,
    pub is_required: bool,
    pub now:         DateTime<Utc>,
}

impl WorkflowStep {
    /// 新しいワークフローステップを作成する
    pub fn new(params: NewWorkflowStep) -> Self {
        Self {
            id: params.id,
            workflow_id: params.workflow_id,
            step_order: params.step_order,
            step_name: params.step_name,
            step_type: params.step_type,
            approver: params.approver,
            is_required: params.is_required,
            created_at: params.now,
        }
    }

    /// 既存のデータから復元する
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: WorkflowStepId,
        workflow_id: WorkflowId,
        step_order: StepOrder,
        step_name: String,
        step_type: StepType,
        approver: ApproverSpec,
        is_required: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            workflow_id,
            step_order,
            step_name,
            step_type,
            approver,
            is_required,
            created_at,
        }
    }

    pub fn id(&self) -> &WorkflowStepId {
        &self.id
    }

    pub fn workflow_id(&self) -> &WorkflowId {
        &self.workflow_id
    }

    pub fn step_order(&self) -> StepOrder {
        self.step_order
    }

    pub fn step_name(&self) -> &str {
        &self.step_name
    }

    pub fn step_type(&self) -> StepType {
        self.step_type
    }

    pub fn approver(&self) -> &ApproverSpec {
        &self.approver
    }

    pub fn is_required(&self) -> bool {
        self.is_required
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_step_type_from_str_正常系() {
        assert_eq!("decision".parse::<StepType>().unwrap(), StepType::Decision);
        assert_eq!("opinion".parse::<StepType>().unwrap(), StepType::Opinion);
    }

    #[test]
    fn test_step_type_from_str_不正な値はエラー() {
        assert!("review".parse::<StepType>().is_err());
    }

    #[test]
    fn test_approver_spec_のdbラウンドトリップ() {
        let user_id = UserId::new();
        let spec = ApproverSpec::User(user_id.clone());

        let restored = ApproverSpec::from_db(spec.kind(), *spec.approver_uuid()).unwrap();

        assert_eq!(restored, ApproverSpec::User(user_id));
    }

    #[test]
    fn test_approver_spec_role種別() {
        let role_id = RoleId::new();
        let spec = ApproverSpec::Role(role_id.clone());

        assert_eq!(spec.kind(), "role");
        assert_eq!(spec.approver_uuid(), role_id.as_uuid());
    }

    #[test]
    fn test_approver_spec_不正な種別はエラー() {
        let result = ApproverSpec::from_db("group", uuid::Uuid::now_v7());

        assert!(result.is_err());
    }
}
