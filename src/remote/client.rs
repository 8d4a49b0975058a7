//! Compute service client.
//!
//! [`ComputeService`] is the seam between the planner/executor and the
//! remote management API. [`LambdaClient`] implements it on top of the AWS
//! Lambda SDK. No call is retried: any failure is returned as-is.

use async_trait::async_trait;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::types::{FunctionCode, FunctionConfiguration, Runtime, VpcConfig};
use aws_sdk_lambda::Client;
use tracing::{debug, info};

use crate::error::{PublishError, RemoteError, Result};

use super::types::{CreateFunctionRequest, RemoteFunction, UpdateCodeRequest, UpdateConfigurationRequest};

/// Management API of the compute service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComputeService: Send + Sync {
    /// Lists every function known to the service.
    async fn list_functions(&self) -> Result<Vec<RemoteFunction>>;

    /// Creates a function, returning the published version if any.
    async fn create_function(&self, request: &CreateFunctionRequest) -> Result<Option<String>>;

    /// Updates role, handler, description, timeout and memory.
    async fn update_function_configuration(&self, request: &UpdateConfigurationRequest) -> Result<()>;

    /// Replaces the function code, returning the published version if any.
    async fn update_function_code(&self, request: &UpdateCodeRequest) -> Result<Option<String>>;

    /// Deletes a function.
    async fn delete_function(&self, name: &str) -> Result<()>;
}

/// AWS Lambda implementation of [`ComputeService`].
#[derive(Debug, Clone)]
pub struct LambdaClient {
    /// Lambda SDK client.
    client: Client,
}

impl LambdaClient {
    /// Creates a client from a loaded AWS configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Converts an SDK function configuration into a [`RemoteFunction`].
    fn to_remote(function: &FunctionConfiguration) -> Result<RemoteFunction> {
        let name = function
            .function_name()
            .ok_or_else(|| RemoteError::invalid("Listed function has no name"))?;

        Ok(RemoteFunction {
            name: name.to_string(),
            handler: function.handler().unwrap_or_default().to_string(),
            role: function.role().unwrap_or_default().to_string(),
            memory_mb: function
                .memory_size()
                .and_then(|m| u32::try_from(m).ok())
                .unwrap_or_default(),
            timeout_seconds: function
                .timeout()
                .and_then(|t| u32::try_from(t).ok())
                .unwrap_or_default(),
            last_modified: function
                .last_modified()
                .ok_or_else(|| RemoteError::invalid(format!("Function {name} has no LastModified")))?
                .to_string(),
        })
    }
}

/// Converts a metadata value to the SDK's integer type.
fn to_sdk_int(value: u32, field: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| PublishError::internal(format!("{field} value {value} overflows")))
}

#[async_trait]
impl ComputeService for LambdaClient {
    async fn list_functions(&self) -> Result<Vec<RemoteFunction>> {
        let mut functions = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_functions()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| RemoteError::request("ListFunctions", DisplayErrorContext(&e).to_string()))?;

            for function in output.functions() {
                functions.push(Self::to_remote(function)?);
            }

            marker = output.next_marker().map(String::from);
            if marker.is_none() {
                break;
            }
            debug!("Fetching next page of functions");
        }

        debug!("Listed {} functions", functions.len());
        Ok(functions)
    }

    async fn create_function(&self, request: &CreateFunctionRequest) -> Result<Option<String>> {
        let code = FunctionCode::builder()
            .s3_bucket(&request.code.bucket)
            .s3_key(&request.code.key)
            .build();

        let vpc = request.vpc.as_ref().map(|v| {
            VpcConfig::builder()
                .set_subnet_ids(Some(v.subnet_ids.clone()))
                .set_security_group_ids(Some(v.security_group_ids.clone()))
                .build()
        });

        let output = self
            .client
            .create_function()
            .function_name(&request.name)
            .runtime(Runtime::from(request.runtime.as_str()))
            .role(&request.role)
            .handler(&request.handler)
            .code(code)
            .description(&request.description)
            .timeout(to_sdk_int(request.timeout_seconds, "timeout")?)
            .memory_size(to_sdk_int(request.memory_mb, "memory")?)
            .set_vpc_config(vpc)
            .publish(request.publish)
            .send()
            .await
            .map_err(|e| RemoteError::request("CreateFunction", DisplayErrorContext(&e).to_string()))?;

        info!("Created function {} (version {:?})", request.name, output.version());
        Ok(output.version().map(String::from))
    }

    async fn update_function_configuration(&self, request: &UpdateConfigurationRequest) -> Result<()> {
        self.client
            .update_function_configuration()
            .function_name(&request.name)
            .role(&request.role)
            .handler(&request.handler)
            .description(&request.description)
            .timeout(to_sdk_int(request.timeout_seconds, "timeout")?)
            .memory_size(to_sdk_int(request.memory_mb, "memory")?)
            .send()
            .await
            .map_err(|e| {
                RemoteError::request("UpdateFunctionConfiguration", DisplayErrorContext(&e).to_string())
            })?;

        info!("Updated configuration of {}", request.name);
        Ok(())
    }

    async fn update_function_code(&self, request: &UpdateCodeRequest) -> Result<Option<String>> {
        let output = self
            .client
            .update_function_code()
            .function_name(&request.name)
            .s3_bucket(&request.code.bucket)
            .s3_key(&request.code.key)
            .publish(request.publish)
            .send()
            .await
            .map_err(|e| RemoteError::request("UpdateFunctionCode", DisplayErrorContext(&e).to_string()))?;

        info!("Updated code of {} (version {:?})", request.name, output.version());
        Ok(output.version().map(String::from))
    }

    async fn delete_function(&self, name: &str) -> Result<()> {
        self.client
            .delete_function()
            .function_name(name)
            .send()
            .await
            .map_err(|e| RemoteError::request("DeleteFunction", DisplayErrorContext(&e).to_string()))?;

        info!("Deleted function {name}");
        Ok(())
    }
}
