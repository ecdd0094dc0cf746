use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::index::PineconeIndex;
use crate::llm::OpenAiClient;
use crate::pipeline::{Assistant, Conversation, Retriever, Synthesizer};

pub const LOCATION: &str = "Jupiter Orbital Zone";

/// Snapshot of the operational display. Written once a second by the clock
/// task, read by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayStatus {
    pub system_status: String,
    pub current_time: String,
}

impl DisplayStatus {
    fn now() -> Self {
        Self {
            system_status: "ONLINE".to_string(),
            current_time: Local::now().format("%H:%M:%S").to_string(),
        }
    }
}

/// Global application state shared across all routes and background tasks.
///
/// Contains references to:
/// - Configuration and paths
/// - The assistant pipeline (provider + index clients behind trait objects)
/// - The single conversation session and its display status
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Settings,
    pub conversation: Mutex<Conversation>,
    pub assistant: Assistant,
    pub status: RwLock<DisplayStatus>,
    #[allow(dead_code)]
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// This process includes:
    /// 1. Resolving paths and loading + validating configuration
    /// 2. Constructing the provider and index clients
    /// 3. Wiring the assistant pipeline
    pub fn initialize() -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(AppPaths::new());
        let config = ConfigService::new(paths.clone());
        let settings = Settings::load(&config.load_config())?;

        let provider = Arc::new(OpenAiClient::new(
            &settings.provider,
            settings.index.dimension,
        )?);
        let index = Arc::new(PineconeIndex::new(&settings.index)?);

        let retriever = Retriever::new(provider.clone(), index);
        let synthesizer = Synthesizer::new(provider, &settings.pipeline);
        let assistant = Assistant::new(retriever, synthesizer, settings.pipeline.clone());

        Ok(Arc::new(AppState {
            paths,
            config,
            settings,
            conversation: Mutex::new(Conversation::new()),
            assistant,
            status: RwLock::new(DisplayStatus::now()),
            started_at: Utc::now(),
        }))
    }

    /// Spawns the once-a-second clock refresh. The spawned task is the only
    /// writer of the display status and never touches the conversation.
    pub fn spawn_clock(self: &Arc<Self>) {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                *state.status.write().await = DisplayStatus::now();
            }
        });
    }
}
