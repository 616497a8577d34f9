//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換など、複数のユースケースで繰り返される
//! パターンを共通化する。

use shinseiflow_infra::InfraError;

use crate::error::CoreError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, CoreError>` に変換する
///
/// `find_by_id` 等の `Option` を返すリポジトリメソッドの結果を、
/// `CoreError::NotFound` または `CoreError::Internal` に変換する。
///
/// ```ignore
/// // Before
/// let request = self.deps.request_repo.find_by_id(&request_id).await
///     .map_err(|e| CoreError::Internal(format!("申請の取得に失敗: {}", e)))?
///     .ok_or_else(|| CoreError::NotFound("申請が見つかりません".to_string()))?;
///
/// // After
/// let request = self.deps.request_repo.find_by_id(&request_id).await
///     .or_not_found("申請")?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `CoreError::NotFound`、`InfraError` の場合は `CoreError::Internal` を返す
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError> {
        self.map_err(|e| CoreError::Internal(format!("{}の取得に失敗: {}", entity_name, e)))?
            .ok_or_else(|| CoreError::NotFound(format!("{}が見つかりません", entity_name)))
    }
}
