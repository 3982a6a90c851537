// Background analysis worker

use std::sync::Arc;

use tracing::{error, info, warn, Instrument};

use crate::analysis::{self, prompt, RepairedAnalysis};
use crate::config::{ImageConfig, LLMConfig};
use crate::llm::LLMAdapter;
use crate::queue::jobs::JobStore;
use crate::types::{AppResult, LLMMessage, LLMRequest};

/// Runs one analysis per submitted image: transcode, ask the model,
/// repair the answer, record the outcome on the job.
#[derive(Clone)]
pub struct AnalysisWorker {
    jobs: JobStore,
    llm: Arc<dyn LLMAdapter>,
    llm_config: LLMConfig,
    image_config: ImageConfig,
}

impl AnalysisWorker {
    pub fn new(jobs: JobStore, llm: Arc<dyn LLMAdapter>, llm_config: LLMConfig, image_config: ImageConfig) -> Self {
        Self {
            jobs,
            llm,
            llm_config,
            image_config,
        }
    }

    /// Fire-and-forget: the caller has already registered `job_id`.
    pub fn spawn(&self, job_id: String, image_base64: String) {
        let worker = self.clone();
        let span = tracing::info_span!("analysis", job_id = %job_id);
        tokio::spawn(async move { worker.process_job(&job_id, image_base64).await }.instrument(span));
    }

    pub async fn process_job(&self, job_id: &str, image_base64: String) {
        let outcome = match self.analyze(image_base64).await {
            Ok(repaired) => {
                info!(
                    pattern = repaired.pattern_name().unwrap_or("<unnamed>"),
                    keys = %repaired.keys().join(", "),
                    "Analysis complete"
                );
                self.jobs.complete(job_id, repaired.document).await
            }
            Err(e) => {
                error!(error = %e, "Analysis failed");
                self.jobs.fail(job_id, e.to_string()).await
            }
        };

        if let Err(e) = outcome {
            warn!(error = %e, "Could not record analysis outcome");
        }
    }

    async fn analyze(&self, image_base64: String) -> AppResult<RepairedAnalysis> {
        let image = analysis::prepare_image(image_base64, self.image_config.clone()).await?;
        info!(
            original_kb = image.original_bytes / 1024,
            encoded_kb = image.encoded_bytes / 1024,
            width = image.width,
            height = image.height,
            "Image transcoded"
        );

        let request = LLMRequest {
            model: self.llm_config.model.clone(),
            messages: vec![LLMMessage::user_with_base64_image(
                prompt::USER_INSTRUCTION,
                image.base64,
                image.media_type,
            )],
            max_tokens: Some(self.llm_config.max_tokens),
            system_instruction: Some(prompt::SYSTEM_PROMPT.to_string()),
        };

        let response = self.llm.create_chat_completion(&request).await?;
        info!(
            finish_reason = %response.finish_reason,
            input_tokens = response.usage.prompt_tokens,
            output_tokens = response.usage.completion_tokens,
            "Model responded"
        );

        let repaired = analysis::repair_analysis(&response.content)?;
        if repaired.backfilled.cultural_shifts {
            info!("cultural_shifts missing, added fallback");
        }
        if repaired.backfilled.pattern_profile {
            info!("pattern_profile missing, added fallback");
        }
        Ok(repaired)
    }
}
