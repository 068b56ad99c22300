//! Global logging for the contract engine
//!
//! Events go to a process-wide `LoggingService` once one is installed. A thread may
//! install its own service with [`with_thread_logger`], which takes precedence over
//! the global one; tests use this to capture events without racing each other.
//! Emitting with no service installed is a no-op.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{
    ConsoleLogger, Logger, LoggingService, MemoryLogger, MultiLogger, StructuredLogger,
};

#[cfg(feature = "logging")]
pub use service::FacadeLogger;

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

thread_local! {
    static THREAD_LOGGER: RefCell<Option<Arc<LoggingService>>> = const { RefCell::new(None) };
    static SUBJECT_CONTEXT: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging from runtime preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;

    let logging_service = Arc::new(service::create_configured_service());

    verify_code_metadata(
        &logging_service,
        &[
            codes::violations::COMPOSITION_CONFLICT,
            codes::violations::ARGUMENT_MISMATCH,
            codes::registry::UNKNOWN_SUBJECT,
        ],
    )?;

    GLOBAL_LOGGER
        .set(logging_service.clone())
        .map_err(|_| "Global logger already initialized")?;

    logging_service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));

    Ok(())
}

/// Every code in `required` must have registered metadata
fn verify_code_metadata(service: &LoggingService, required: &[Code]) -> Result<(), String> {
    for code in required {
        if codes::get_description(code.as_str()) == "Unknown error" {
            let message = format!("Missing metadata for code: {}", code);
            service.log_error(codes::system::INITIALIZATION_FAILURE, &message);
            return Err(message);
        }
    }
    Ok(())
}

/// Initialize with a custom service
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// Safe access to the global logger
pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

// ============================================================================
// THREAD-LOCAL OVERRIDES
// ============================================================================

/// Route every event emitted on this thread inside `f` to `service`
pub fn with_thread_logger<F, R>(service: Arc<LoggingService>, f: F) -> R
where
    F: FnOnce() -> R,
{
    let previous = THREAD_LOGGER.with(|slot| slot.borrow_mut().replace(service));
    let result = f();
    THREAD_LOGGER.with(|slot| *slot.borrow_mut() = previous);
    result
}

fn dispatch(event: LogEvent) {
    let local = THREAD_LOGGER.with(|slot| slot.borrow().clone());
    match local {
        Some(service) => service.log_event(event),
        None => {
            if let Some(logger) = try_get_global_logger() {
                logger.log_event(event);
            }
        }
    }
}

// ============================================================================
// SUBJECT CONTEXT
// ============================================================================

/// Push a subject name onto this thread's context stack
pub fn push_subject_context(subject: &str) {
    SUBJECT_CONTEXT.with(|stack| stack.borrow_mut().push(subject.to_string()));
}

pub fn pop_subject_context() {
    SUBJECT_CONTEXT.with(|stack| {
        stack.borrow_mut().pop();
    });
}

/// Execute `f` with `subject` as the innermost subject context
pub fn with_subject_context<F, R>(subject: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    push_subject_context(subject);
    let result = f();
    pop_subject_context();
    result
}

pub fn get_current_subject_context() -> Option<String> {
    SUBJECT_CONTEXT.with(|stack| stack.borrow().last().cloned())
}

fn attach_context(mut event: LogEvent, context: Vec<(&str, &str)>) -> LogEvent {
    for (key, value) in context {
        event = event.with_context(key, value);
    }

    if config::include_subject_context() && !event.context.contains_key("subject") {
        if let Some(subject) = get_current_subject_context() {
            event = event.with_context("subject", &subject);
        }
    }

    event
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

pub fn log_error_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    dispatch(attach_context(LogEvent::error(code, message), context));
}

pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    dispatch(attach_context(LogEvent::success(code, message), context));
}

pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(attach_context(LogEvent::info(message), context));
}

pub fn log_warning_with_context(code: Option<Code>, message: &str, context: Vec<(&str, &str)>) {
    let event = match code {
        Some(code) => LogEvent::warning_with_code(code, message),
        None => LogEvent::warning(message),
    };
    dispatch(attach_context(event, context));
}

pub fn log_debug_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(attach_context(LogEvent::debug(message), context));
}
