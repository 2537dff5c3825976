use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ssm::config::{Credentials as StaticCredentials, Region};
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::{Client as SsmClient, types::ParameterType};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::request::Credentials;
use crate::errors::PluginError;

static REGION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid region pattern"));

/// Arguments of a single "set parameter" call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutParameter<'a> {
    pub name: &'a str,
    pub value: &'a str,
    pub parameter_type: &'a str,
    pub overwrite: bool,
}

/// An authenticated Parameter Store session.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Returns the parameter's value, decrypted when `decrypt` is set.
    async fn get_parameter(&self, name: &str, decrypt: bool) -> Result<String, PluginError>;

    /// Writes the parameter and returns its new version.
    async fn put_parameter(&self, request: &PutParameter<'_>) -> Result<i64, PluginError>;
}

/// Opens a fresh session for one invocation.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, credentials: &Credentials) -> Result<Box<dyn ParameterStore>, PluginError>;
}

/// # Errors
///
/// Returns a `SessionError` if `region` is empty or not a lowercase,
/// dash-separated code. Anything else goes to the SDK unchanged.
pub fn validate_region(region: &str) -> Result<(), PluginError> {
    if REGION_PATTERN.is_match(region) {
        Ok(())
    } else {
        Err(PluginError::SessionError(format!(
            "malformed region '{region}'"
        )))
    }
}

/// Session factory backed by the AWS SDK and static credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsSessionFactory;

#[async_trait]
impl SessionFactory for AwsSessionFactory {
    async fn open(&self, credentials: &Credentials) -> Result<Box<dyn ParameterStore>, PluginError> {
        validate_region(&credentials.region)?;

        let provider = StaticCredentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None,
            None,
            "flowplugins-static",
        );
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(credentials.region.clone()))
            .credentials_provider(provider)
            .load()
            .await;
        debug!(region = %credentials.region, "opened ssm session");

        Ok(Box::new(AwsParameterStore::new(SsmClient::new(&shared))))
    }
}

pub struct AwsParameterStore {
    client: SsmClient,
}

impl AwsParameterStore {
    #[must_use]
    pub fn new(client: SsmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for AwsParameterStore {
    async fn get_parameter(&self, name: &str, decrypt: bool) -> Result<String, PluginError> {
        let resp = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(decrypt)
            .send()
            .await
            .map_err(|e| {
                PluginError::AwsError(format!(
                    "ssm get_parameter {name}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        resp.parameter()
            .and_then(|param| param.value())
            .map(str::to_string)
            .ok_or_else(|| PluginError::AwsError(format!("ssm get_parameter {name}: no value")))
    }

    async fn put_parameter(&self, request: &PutParameter<'_>) -> Result<i64, PluginError> {
        let resp = self
            .client
            .put_parameter()
            .name(request.name)
            .value(request.value)
            .r#type(ParameterType::from(request.parameter_type))
            .overwrite(request.overwrite)
            .send()
            .await
            .map_err(|e| {
                PluginError::AwsError(format!(
                    "ssm put_parameter {}: {}",
                    request.name,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(resp.version())
    }
}
