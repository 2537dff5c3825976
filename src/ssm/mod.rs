//! AWS Systems Manager Parameter Store activity.

pub mod activity;
pub mod output;
pub mod request;
pub mod store;

pub use activity::SsmActivity;
pub use output::{OutputEnvelope, ParameterResultMap, ParameterValue, shape};
pub use request::{Action, ActionRequest, Credentials};
pub use store::{AwsParameterStore, AwsSessionFactory, ParameterStore, PutParameter, SessionFactory};

pub const IV_ACTION: &str = "action";
pub const IV_AWS_ACCESS_KEY_ID: &str = "awsAccessKeyID";
pub const IV_AWS_SECRET_ACCESS_KEY: &str = "awsSecretAccessKey";
pub const IV_AWS_REGION: &str = "awsRegion";
pub const IV_PARAMETER_NAME: &str = "parameterName";
pub const IV_DECRYPT_PARAMETER: &str = "decryptParameter";
pub const IV_PARAMETER_VALUE: &str = "parameterValue";
pub const IV_OVERWRITE_EXISTING_PARAMETER: &str = "overwriteExistingParameter";
pub const IV_PARAMETER_TYPE: &str = "parameterType";
pub const OV_RESULT: &str = "result";

/// Output value for an action the activity does not recognize.
pub const UNKNOWN_ACTION_RESULT: &str = "NOK";
