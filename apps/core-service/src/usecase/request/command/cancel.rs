//! 申請の取り消し

use shinseiflow_domain::{request::RequestId, user::UserId};
use shinseiflow_shared::{event_log::event, log_business_event};

use crate::{
    error::CoreError,
    usecase::{helpers::FindResultExt, request::RequestUseCaseImpl},
};

impl RequestUseCaseImpl {
    /// 申請を取り消す
    ///
    /// 申請者本人のみ、承認待ちまたは処理中の申請を取り消せる。
    ///
    /// ## エラー
    ///
    /// - `Forbidden`: 申請者以外による取り消し
    /// - `BadRequest`: 終端状態の申請
    pub async fn cancel_request(
        &self,
        request_id: RequestId,
        acting_user: UserId,
    ) -> Result<shinseiflow_domain::request::Request, CoreError> {
        let request = self
            .deps
            .request_repo
            .find_by_id(&request_id)
            .await
            .or_not_found("申請")?;

        if request.requester_id() != &acting_user {
            return Err(CoreError::Forbidden(
                "申請を取り消せるのは申請者本人のみです".to_string(),
            ));
        }

        let now = self.deps.clock.now();
        let expected_version = request.version();
        let cancelled = request
            .cancelled(now)
            .map_err(|e| CoreError::BadRequest(e.to_string()))?;

        let mut tx = self.begin_tx().await?;
        self.save_request(&mut tx, &cancelled, expected_version)
            .await?;
        self.commit_tx(tx).await?;

        log_business_event!(
            event.category = event::category::REQUEST,
            event.action = event::action::REQUEST_CANCELLED,
            event.entity_type = event::entity_type::REQUEST,
            event.entity_id = %cancelled.id(),
            event.actor_id = %acting_user,
            event.result = event::result::SUCCESS,
            "申請取り消し"
        );

        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shinseiflow_domain::{
        request::RequestStatus,
        user::UserId,
        value_objects::Priority,
    };

    use super::super::test_helpers::{TestWorld, add_request_type, build_sut, simple_form_data};
    use crate::{
        error::CoreError,
        usecase::request::CreateRequestInput,
    };

    async fn create_simple_request(
        world: &TestWorld,
        requester: &UserId,
    ) -> shinseiflow_domain::request::Request {
        let request_type = add_request_type(world, None);
        let sut = build_sut(world);
        sut.create_request(
            CreateRequestInput {
                request_type_id: request_type.id().clone(),
                title: "物品購入".to_string(),
                form_data: simple_form_data(),
                priority: Priority::Low,
                due_date: None,
            },
            requester.clone(),
        )
        .await
        .unwrap()
        .request
    }

    #[tokio::test]
    async fn test_申請者本人は取り消せる() {
        let world = TestWorld::new();
        let requester = UserId::new();
        let request = create_simple_request(&world, &requester).await;
        let sut = build_sut(&world);

        let result = sut
            .cancel_request(request.id().clone(), requester)
            .await
            .unwrap();

        assert_eq!(result.status(), RequestStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_申請者以外の取り消しはforbidden() {
        let world = TestWorld::new();
        let requester = UserId::new();
        let request = create_simple_request(&world, &requester).await;
        let sut = build_sut(&world);

        let result = sut.cancel_request(request.id().clone(), UserId::new()).await;

        assert!(matches!(result, Err(CoreError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_取り消し済みの再取り消しはbad_request() {
        let world = TestWorld::new();
        let requester = UserId::new();
        let request = create_simple_request(&world, &requester).await;
        let sut = build_sut(&world);

        sut.cancel_request(request.id().clone(), requester.clone())
            .await
            .unwrap();

        let result = sut.cancel_request(request.id().clone(), requester).await;

        assert!(matches!(result, Err(CoreError::BadRequest(_))));
    }
}
