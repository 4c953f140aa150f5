//! ProjectDirectory port - プロジェクト（ジオフェンス）参照
//!
//! プロジェクトの CRUD はこのクレートの範囲外。ここでは読み取りのみ。

use async_trait::async_trait;

use crate::domain::{Project, ProjectId, StoreError};

#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn get(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;
}
