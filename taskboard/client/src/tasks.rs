use crate::api::ApiClient;
use async_trait::async_trait;
use taskboard_core::{GatewayError, RemoteGateway, TaskDraft, TaskId, TaskPatch, TaskRecord};

#[async_trait]
impl RemoteGateway for ApiClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_all(&self) -> Result<Vec<TaskRecord>, GatewayError> {
        let url = self.endpoint(&["task", "getAll"])?;
        let records: Vec<TaskRecord> = self.send(self.http().get(url)).await?;
        tracing::info!("Fetched {} tasks", records.len());
        Ok(records)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<TaskRecord, GatewayError> {
        let id = id.to_string();
        let url = self.endpoint(&["task", "update", &id])?;
        self.send(self.http().put(url).json(patch)).await
    }

    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    async fn create(&self, draft: &TaskDraft) -> Result<TaskRecord, GatewayError> {
        let url = self.endpoint(&["task", "add"])?;
        let record: TaskRecord = self.send(self.http().post(url).json(draft)).await?;
        tracing::info!("Created task {}", record.id);
        Ok(record)
    }
}
