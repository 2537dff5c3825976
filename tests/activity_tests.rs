use async_trait::async_trait;
use flowplugins::core::context::InvocationContext;
use flowplugins::errors::PluginError;
use flowplugins::ssm::{
    Credentials, ParameterStore, PutParameter, SessionFactory, SsmActivity,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Open(String),
    Get(String, bool),
    Put {
        name: String,
        value: String,
        parameter_type: String,
        overwrite: bool,
    },
}

/// Scripted parameter store that records every call it receives.
#[derive(Clone, Default)]
struct FakeSessions {
    calls: Arc<Mutex<Vec<Call>>>,
    values: HashMap<String, String>,
    version: i64,
    fail_open: bool,
    fail_put: bool,
}

impl FakeSessions {
    fn with_values(values: &[(&str, &str)]) -> Self {
        Self {
            values: values
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

struct FakeStore(FakeSessions);

#[async_trait]
impl ParameterStore for FakeStore {
    async fn get_parameter(&self, name: &str, decrypt: bool) -> Result<String, PluginError> {
        self.0
            .calls
            .lock()
            .unwrap()
            .push(Call::Get(name.to_string(), decrypt));
        self.0
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::AwsError(format!("ssm get_parameter {name}: ParameterNotFound")))
    }

    async fn put_parameter(&self, request: &PutParameter<'_>) -> Result<i64, PluginError> {
        self.0.calls.lock().unwrap().push(Call::Put {
            name: request.name.to_string(),
            value: request.value.to_string(),
            parameter_type: request.parameter_type.to_string(),
            overwrite: request.overwrite,
        });
        if self.0.fail_put {
            return Err(PluginError::AwsError(format!(
                "ssm put_parameter {}: ParameterAlreadyExists",
                request.name
            )));
        }
        Ok(self.0.version)
    }
}

#[async_trait]
impl SessionFactory for FakeSessions {
    async fn open(&self, credentials: &Credentials) -> Result<Box<dyn ParameterStore>, PluginError> {
        if self.fail_open {
            return Err(PluginError::SessionError("no credentials provider".into()));
        }
        self.calls
            .lock()
            .unwrap()
            .push(Call::Open(credentials.region.clone()));
        Ok(Box::new(FakeStore(self.clone())))
    }
}

fn context(extra: Value) -> InvocationContext {
    let mut inputs = json!({
        "awsAccessKeyID": "AKIAEXAMPLE",
        "awsSecretAccessKey": "secret",
        "awsRegion": "us-east-1"
    });
    if let (Some(base), Some(extra)) = (inputs.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }
    InvocationContext::from_value(inputs).unwrap()
}

#[tokio::test]
async fn test_retrieve_list_issues_lookups_in_order() {
    let sessions = FakeSessions::with_values(&[("a", "1"), ("b", "two"), ("c", "3.10")]);
    let activity = SsmActivity::new(sessions.clone()).unwrap();
    let mut ctx = context(json!({
        "action": "retrieveList",
        "parameterName": "a,b,c",
        "decryptParameter": true
    }));

    assert!(activity.eval(&mut ctx).await.unwrap());

    assert_eq!(
        sessions.calls(),
        vec![
            Call::Open("us-east-1".into()),
            Call::Get("a".into(), true),
            Call::Get("b".into(), true),
            Call::Get("c".into(), true),
        ]
    );
    assert_eq!(
        ctx.output("result").unwrap(),
        &json!({"results": {"a": "1", "b": "two", "c": "3.10"}})
    );
}

#[tokio::test]
async fn test_retrieve_list_aborts_on_first_failure() {
    let sessions = FakeSessions::with_values(&[("a", "1"), ("c", "3")]);
    let activity = SsmActivity::new(sessions.clone()).unwrap();
    let mut ctx = context(json!({
        "action": "retrieveList",
        "parameterName": "a,b,c",
        "decryptParameter": false
    }));

    let err = activity.eval(&mut ctx).await.unwrap_err();

    assert!(matches!(err, PluginError::AwsError(ref m) if m.contains("ParameterNotFound")));
    assert_eq!(
        sessions.calls(),
        vec![
            Call::Open("us-east-1".into()),
            Call::Get("a".into(), false),
            Call::Get("b".into(), false),
        ]
    );
    assert!(ctx.output("result").is_none());
}

#[tokio::test]
async fn test_retrieve_single_parameter() {
    let sessions = FakeSessions::with_values(&[("/db/password", "s3cr3t")]);
    let activity = SsmActivity::new(sessions.clone()).unwrap();
    let mut ctx = context(json!({
        "action": "retrieve",
        "parameterName": "/db/password",
        "decryptParameter": true
    }));

    assert!(activity.eval(&mut ctx).await.unwrap());
    assert_eq!(
        ctx.output("result").unwrap(),
        &json!({"results": {"/db/password": "s3cr3t"}})
    );
    assert_eq!(sessions.calls().len(), 2);
}

#[tokio::test]
async fn test_store_issues_one_write_and_returns_version() {
    let sessions = FakeSessions {
        version: 7,
        ..FakeSessions::default()
    };
    let activity = SsmActivity::new(sessions.clone()).unwrap();
    let mut ctx = context(json!({
        "action": "store",
        "parameterName": "/app/flag",
        "parameterValue": "x",
        "parameterType": "String",
        "overwriteExistingParameter": true
    }));

    assert!(activity.eval(&mut ctx).await.unwrap());

    let writes: Vec<Call> = sessions
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Put { .. }))
        .collect();
    assert_eq!(
        writes,
        vec![Call::Put {
            name: "/app/flag".into(),
            value: "x".into(),
            parameter_type: "String".into(),
            overwrite: true,
        }]
    );

    let result = ctx.output("result").unwrap();
    assert_eq!(result["results"]["/app/flag"].to_string(), "7");
}

#[tokio::test]
async fn test_unknown_action_returns_nok_without_session() {
    let sessions = FakeSessions::default();
    let activity = SsmActivity::new(sessions.clone()).unwrap();
    let mut ctx = context(json!({ "action": "delete" }));

    assert!(activity.eval(&mut ctx).await.unwrap());
    assert_eq!(ctx.output("result").unwrap(), &json!("NOK"));
    assert!(sessions.calls().is_empty());
}

#[tokio::test]
async fn test_missing_credentials_fail_before_session() {
    let sessions = FakeSessions::default();
    let activity = SsmActivity::new(sessions.clone()).unwrap();
    let mut ctx = InvocationContext::from_value(json!({
        "action": "retrieve",
        "awsAccessKeyID": "AKIAEXAMPLE",
        "awsRegion": "us-east-1",
        "parameterName": "a",
        "decryptParameter": true
    }))
    .unwrap();

    let err = activity.eval(&mut ctx).await.unwrap_err();

    assert!(matches!(err, PluginError::ConfigError(ref m) if m.contains("awsSecretAccessKey")));
    assert!(sessions.calls().is_empty());
}

#[tokio::test]
async fn test_mistyped_flag_is_config_error() {
    let sessions = FakeSessions::default();
    let activity = SsmActivity::new(sessions.clone()).unwrap();
    let mut ctx = context(json!({
        "action": "store",
        "parameterName": "/app/flag",
        "parameterValue": "x",
        "parameterType": "String",
        "overwriteExistingParameter": "yes"
    }));

    let err = activity.eval(&mut ctx).await.unwrap_err();

    assert!(matches!(err, PluginError::ConfigError(ref m) if m.contains("must be a boolean")));
    assert!(sessions.calls().is_empty());
}

#[test]
fn test_activity_exposes_metadata() {
    let activity = SsmActivity::new(FakeSessions::default()).unwrap();
    let metadata = activity.metadata();

    assert_eq!(metadata.name, "amazonssm");
    assert!(metadata.output("result").is_some());
    let action = metadata.input("action").unwrap();
    assert_eq!(action.allowed, vec!["store", "retrieve", "retrieveList"]);
}

#[tokio::test]
async fn test_session_failure_aborts_before_any_call() {
    let sessions = FakeSessions {
        fail_open: true,
        ..FakeSessions::with_values(&[("a", "1")])
    };
    let activity = SsmActivity::new(sessions.clone()).unwrap();
    let mut ctx = context(json!({
        "action": "retrieveList",
        "parameterName": "a",
        "decryptParameter": true
    }));

    let err = activity.eval(&mut ctx).await.unwrap_err();

    assert!(matches!(err, PluginError::SessionError(_)));
    assert!(sessions.calls().is_empty());
    assert!(ctx.output("result").is_none());
}

#[tokio::test]
async fn test_store_failure_leaves_result_unset() {
    let sessions = FakeSessions {
        fail_put: true,
        ..FakeSessions::default()
    };
    let activity = SsmActivity::new(sessions.clone()).unwrap();
    let mut ctx = context(json!({
        "action": "store",
        "parameterName": "/app/flag",
        "parameterValue": "x",
        "parameterType": "String",
        "overwriteExistingParameter": false
    }));

    let err = activity.eval(&mut ctx).await.unwrap_err();

    assert!(matches!(err, PluginError::AwsError(ref m) if m.contains("ParameterAlreadyExists")));
    let puts = sessions
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Put { .. }))
        .count();
    assert_eq!(puts, 1);
    assert!(ctx.output("result").is_none());
}
