//! Common test utilities for E2E tests

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tempfile::TempDir;
use tokio::net::TcpListener;
use vidstream::data::{Database, EntityId, User, Video};
use vidstream::error::AppError;
use vidstream::storage::{MediaKind, MediaStore};
use vidstream::{AppState, config};

/// Media store double: no network, deterministic URLs.
pub struct StubMediaStore {
    counter: AtomicU64,
}

impl StubMediaStore {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

#[async_trait::async_trait]
impl MediaStore for StubMediaStore {
    async fn upload(
        &self,
        kind: MediaKind,
        _data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "https://media.test.example.com/{}/upload-{}",
            kind.prefix(),
            n
        ))
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        vidstream::metrics::init_metrics();

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "test.example.com".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            storage: config::StorageConfig {
                bucket: "test-media".to_string(),
                public_url: "https://media.test.example.com".to_string(),
            },
            s3: config::S3Config {
                endpoint: "https://s3.test.example.com".to_string(),
                region: "auto".to_string(),
                access_key_id: "test-key".to_string(),
                secret_access_key: "test-secret".to_string(),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state with the stub media store
        let db = Database::connect(&db_path).await.unwrap();
        let state = AppState {
            config: Arc::new(config),
            db: Arc::new(db),
            storage: Arc::new(StubMediaStore::new()),
        };

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = vidstream::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create a test user in the database
    pub async fn create_user(&self, username: &str) -> User {
        let user = User {
            id: EntityId::generate().as_str().to_string(),
            username: username.to_string(),
            email: format!("{}@test.example.com", username),
            full_name: format!("{} Test", username),
            avatar: String::new(),
            created_at: chrono::Utc::now(),
        };
        self.state.db.insert_user(&user).await.unwrap();
        user
    }

    /// Create a session for the user and return its bearer token
    pub async fn create_token(&self, user: &User) -> String {
        let token = format!("test-token-{}", EntityId::generate());
        self.state
            .db
            .insert_session(&token, &user.id)
            .await
            .unwrap();
        token
    }

    /// Seed a published video owned by the user
    pub async fn create_video(&self, owner: &User, title: &str) -> Video {
        let video = Video {
            id: EntityId::generate().as_str().to_string(),
            title: title.to_string(),
            description: format!("{} description", title),
            duration: 90,
            video_file: "https://media.test.example.com/videos/seed.mp4".to_string(),
            thumbnail: "https://media.test.example.com/thumbnails/seed.webp".to_string(),
            owner_id: owner.id.clone(),
            is_published: true,
            created_at: chrono::Utc::now(),
        };
        self.state.db.insert_video(&video).await.unwrap();
        video
    }
}
