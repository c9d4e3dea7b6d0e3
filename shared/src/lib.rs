pub mod admin;
pub mod auth;
pub mod config;
pub mod contact;
pub mod email;

use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sesv2::Client as SesClient;
use gallery_atoms::store::{DynamoStore, S3Media};

use crate::config::Config;

/// Process-wide collaborators, built once by [`AppState::init`] at cold start.
pub struct AppState {
    pub config: Config,
    pub cognito_client: CognitoClient,
    pub ses_client: SesClient,
    pub store: DynamoStore,
    pub media: S3Media,
}

impl AppState {
    pub async fn init(config: Config) -> Self {
        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let store = DynamoStore::new(DynamoClient::new(&aws), config.table_name.clone());
        let media = S3Media::new(
            S3Client::new(&aws),
            config.bucket_name.clone(),
            config.signed_url_ttl,
        );

        tracing::info!(
            table = %config.table_name,
            bucket = %config.bucket_name,
            "AWS clients initialized"
        );

        AppState {
            cognito_client: CognitoClient::new(&aws),
            ses_client: SesClient::new(&aws),
            store,
            media,
            config,
        }
    }
}
