/*
This code is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 04/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::environments::EnvironmentSettings;
use super::errors::{ExecutorError, ProcessError};
use super::invocation::{build_request, InvocationRequest};
use super::results::{decode, DecodeWarning, ExecutionStatus, InvocationResult};
use super::GeoprocessingTool;
use gp_common::utils::get_formatted_elapsed_time;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The collaborator that actually runs a tool. Transport, cancellation and
/// deadlines are its business; the runtime submits exactly once per call.
pub trait Executor: Send + Sync {
    fn submit(&self, request: &InvocationRequest) -> Result<InvocationResult, ExecutorError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn submit(&self, request: &InvocationRequest) -> Result<InvocationResult, ExecutorError> {
        (**self).submit(request)
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn submit(&self, request: &InvocationRequest) -> Result<InvocationResult, ExecutorError> {
        (**self).submit(request)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn submit(&self, request: &InvocationRequest) -> Result<InvocationResult, ExecutorError> {
        (**self).submit(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Built,
    Validated,
    Submitted,
    Succeeded,
    Failed,
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            InvocationState::Built => "built",
            InvocationState::Validated => "validated",
            InvocationState::Submitted => "submitted",
            InvocationState::Succeeded => "succeeded",
            InvocationState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of a successful `execute()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub state: InvocationState,
    /// The request as submitted.
    pub request: InvocationRequest,
    /// Environment keys forwarded to the executor.
    pub applied_environment: Vec<String>,
    /// Derived values whose coded token was not recognised.
    pub warnings: Vec<DecodeWarning>,
    pub messages: Vec<String>,
    pub elapsed: Duration,
}

impl ExecutionReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Drives one tool invocation: validate and marshal, submit, decode.
pub struct ProcessRuntime<E> {
    executor: E,
}

struct Transitions<'a> {
    tool: &'a str,
    state: InvocationState,
}

impl<'a> Transitions<'a> {
    fn new(tool: &'a str) -> Transitions<'a> {
        log::debug!("{}: {}", tool, InvocationState::Built);
        Transitions {
            tool,
            state: InvocationState::Built,
        }
    }

    fn advance(&mut self, next: InvocationState) {
        log::debug!("{}: {} -> {}", self.tool, self.state, next);
        self.state = next;
    }

    fn fail<T>(&mut self, err: ProcessError) -> Result<T, ProcessError> {
        log::debug!("{}: {} -> {} ({})", self.tool, self.state, InvocationState::Failed, err);
        self.state = InvocationState::Failed;
        Err(err)
    }
}

impl<E: Executor> ProcessRuntime<E> {
    pub fn new(executor: E) -> ProcessRuntime<E> {
        ProcessRuntime { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Validates the tool's values against its descriptor and returns the
    /// request `execute()` would submit, without submitting it.
    pub fn prepare<T>(&self, tool: &T, environment: &EnvironmentSettings) -> Result<InvocationRequest, ProcessError>
    where
        T: GeoprocessingTool + ?Sized,
    {
        build_request(tool.descriptor(), tool.instance().values(), environment)
    }

    /// Runs the tool once. On success the derived parameters of `tool` are
    /// replaced with the decoded outputs; on any failure they are left as
    /// they were.
    pub fn execute<T>(&self, tool: &mut T, environment: &EnvironmentSettings) -> Result<ExecutionReport, ProcessError>
    where
        T: GeoprocessingTool + ?Sized,
    {
        let descriptor = tool.instance().descriptor().clone();
        let mut transitions = Transitions::new(descriptor.name());

        let request = match build_request(&descriptor, tool.instance().values(), environment) {
            Ok(r) => r,
            Err(e) => return transitions.fail(e),
        };
        transitions.advance(InvocationState::Validated);
        if log::log_enabled!(log::Level::Debug) {
            if let Ok(payload) = serde_json::to_string(&request.redacted(&descriptor)) {
                log::debug!("{}: payload {}", descriptor.name(), payload);
            }
        }

        let start = Instant::now();
        transitions.advance(InvocationState::Submitted);
        let result = match self.executor.submit(&request) {
            Ok(r) => r,
            Err(e) => return transitions.fail(ProcessError::ExecutionFailed(e)),
        };
        let elapsed = start.elapsed();

        if result.status == ExecutionStatus::Failed {
            return transitions.fail(ProcessError::ExecutionFailed(ExecutorError::ToolFailed {
                messages: result.messages,
            }));
        }

        let decoded = match decode(&result, &descriptor) {
            Ok(d) => d,
            Err(e) => return transitions.fail(e),
        };
        let values = tool.instance_mut().values_mut();
        for (position, value) in decoded.values {
            values.put(position, value);
        }
        transitions.advance(InvocationState::Succeeded);
        log::info!(
            "{} completed in {}",
            descriptor.execute_name(),
            get_formatted_elapsed_time(elapsed)
        );

        Ok(ExecutionReport {
            state: InvocationState::Succeeded,
            applied_environment: request.environment.keys().cloned().collect(),
            request,
            warnings: decoded.warnings,
            messages: result.messages,
            elapsed,
        })
    }
}
