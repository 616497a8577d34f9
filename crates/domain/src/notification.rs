//! # 通知
//!
//! アプリ内通知のドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`Notification`] | 通知 | notifications テーブルの 1 行。ユーザーの受信箱に表示される |
//! | [`NotificationEventType`] | 通知イベント種別 | 承認依頼、承認完了、却下、期日リマインダーなど |
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: 通知作成の失敗は申請操作の成否に影響しない
//! - **スナップショット**: title / body は作成時点の文面を保持する（後からの
//!   申請タイトル変更等は反映しない）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{request::RequestId, user::UserId};

define_uuid_id! {
    /// 通知 ID（一意識別子）
    pub struct NotificationId;
}

/// 通知イベント種別
///
/// notifications テーブルの `event_type` カラムに格納される値。
/// snake_case でシリアライズされる。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationEventType {
    /// 承認依頼: ステップの承認レコードが作成されたとき → 承認者に送信
    ApprovalRequested,
    /// ステップ承認（中間）: 多段階承認の中間ステップ承認 → 申請者に送信
    StepApproved,
    /// 承認完了: 最終ステップ承認で申請が承認されたとき → 申請者に送信
    RequestApproved,
    /// 却下: ステップ却下で申請が却下されたとき → 申請者に送信
    RequestRejected,
    /// 期日リマインダー: 期日前日の申請について申請者・承認者に送信
    DueReminder,
}

/// 通知エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    id:         NotificationId,
    user_id:    UserId,
    event_type: NotificationEventType,
    title:      String,
    body:       String,
    request_id: Option<RequestId>,
    read_at:    Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

/// 通知の新規作成パラメータ
pub struct NewNotification {
    pub id:         NotificationId,
    pub user_id:    UserId,
    pub event_type: NotificationEventType,
    pub title:      String,
    pub body:       String,
    pub request_id: Option<RequestId>,
    pub now:        DateTime<Utc>,
}

impl Notification {
    /// 新しい通知を作成する（未読）
    pub fn new(params: NewNotification) -> Self {
        Self {
            id: params.id,
            user_id: params.user_id,
            event_type: params.event_type,
            title: params.title,
            body: params.body,
            request_id: params.request_id,
            read_at: None,
            created_at: params.now,
        }
    }

    /// 既存のデータから復元する
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: NotificationId,
        user_id: UserId,
        event_type: NotificationEventType,
        title: String,
        body: String,
        request_id: Option<RequestId>,
        read_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            event_type,
            title,
            body,
            request_id,
            read_at,
            created_at,
        }
    }

    pub fn id(&self) -> &NotificationId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn event_type(&self) -> NotificationEventType {
        self.event_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn read_at(&self) -> Option<DateTime<Utc>> {
        self.read_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 既読にした新しいインスタンスを返す
    pub fn marked_read(self, now: DateTime<Utc>) -> Self {
        Self {
            read_at: Some(now),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn test_notification(now: DateTime<Utc>) -> Notification {
        Notification::new(NewNotification {
            id:         NotificationId::new(),
            user_id:    UserId::new(),
            event_type: NotificationEventType::ApprovalRequested,
            title:      "承認依頼".to_string(),
            body:       "「出張申請」の承認をお願いします".to_string(),
            request_id: Some(RequestId::new()),
            now,
        })
    }

    #[test]
    fn test_新規作成時は未読() {
        let notification = test_notification(Utc::now());

        assert_eq!(notification.read_at(), None);
    }

    #[test]
    fn test_既読化でread_atが設定される() {
        let now = Utc::now();
        let notification = test_notification(now).marked_read(now);

        assert_eq!(notification.read_at(), Some(now));
    }

    #[test]
    fn test_event_typeのsnake_caseシリアライズ() {
        let s: &str = NotificationEventType::ApprovalRequested.into();
        assert_eq!(s, "approval_requested");

        let parsed: NotificationEventType = "due_reminder".parse().unwrap();
        assert_eq!(parsed, NotificationEventType::DueReminder);
    }
}
