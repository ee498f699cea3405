//! JavaScript execution, call interception and page error collection.
//!
//! Scripts run as function bodies in the page's main world and return with
//! `return`. Each script the crate sends starts with a `/* nav-resolver:* */`
//! marker naming its purpose.

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::{CallRecord, Interception};
use crate::error::{Error, Result};
use crate::identifiers::InterceptId;
use crate::protocol::{Command, ScriptCommand};

use super::Page;

// ============================================================================
// Constants
// ============================================================================

/// Page-global map of interception ID to recorded argument tuples.
const CALLS_KEY: &str = "__navResolverCalls";

/// Page-global array of uncaught error messages.
const ERRORS_KEY: &str = "__navResolverErrors";

// ============================================================================
// Page - Script Execution
// ============================================================================

impl Page {
    /// Executes synchronous JavaScript in the page context.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let title = page.execute_script("return document.title").await?;
    /// ```
    pub async fn execute_script(&self, script: &str) -> Result<Value> {
        debug!(tab_id = %self.tab_id(), script_len = script.len(), "Executing script");

        let command = Command::Script(ScriptCommand::Evaluate {
            script: script.to_string(),
            args: vec![],
        });

        let result = self.send_command(command).await?;
        Ok(result.get("value").cloned().unwrap_or(Value::Null))
    }

    /// Rendered text of the document body.
    pub async fn page_text(&self) -> Result<String> {
        let value = self
            .execute_script(
                "/* nav-resolver:text */ return document.body ? document.body.innerText : '';",
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

// ============================================================================
// Page - Interception
// ============================================================================

impl Page {
    /// Replaces `object_path.method` with a stub that records its arguments
    /// and returns `null`.
    ///
    /// `object_path` is a dotted path from `window` (`"window"`,
    /// `"window.history"`). The stub lives as long as the current document.
    ///
    /// # Errors
    ///
    /// [`Error::ScriptError`] if the object path does not exist.
    pub async fn install_interceptor(&self, object_path: &str, method: &str) -> Result<Interception> {
        let id = InterceptId::generate();
        self.execute_script(&interceptor_script(&id, object_path, method))
            .await?;

        let interception = Interception::new(id, object_path, method);
        debug!(%interception, id = %interception.id(), "Interceptor installed");
        Ok(interception)
    }

    /// Reads the calls an interceptor recorded.
    ///
    /// A replaced document reads as an empty record.
    pub async fn read_calls(&self, interception: &Interception) -> Result<CallRecord> {
        let script = format!(
            "/* nav-resolver:calls */ \
             const store = window.{CALLS_KEY}; \
             return store && store[{id}] ? store[{id}] : [];",
            id = json_string(interception.id().as_str()),
        );

        match self.execute_script(&script).await {
            Ok(Value::Null) => Ok(CallRecord::default()),
            Ok(value) => Ok(serde_json::from_value(value)?),
            Err(Error::ScriptError { message }) => {
                warn!(%interception, %message, "Could not read recorded calls");
                Ok(CallRecord::default())
            }
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// Page - Error Collection
// ============================================================================

impl Page {
    /// Registers a preload script that records uncaught errors and unhandled
    /// rejections of every document. Idempotent.
    pub async fn install_error_collector(&self) -> Result<()> {
        if self.inner.collector_id.lock().is_some() {
            return Ok(());
        }

        let command = Command::Script(ScriptCommand::AddPreloadScript {
            script: collector_script(),
        });
        let result = self.send_command(command).await?;
        let script_id = result
            .get("scriptId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("addPreloadScript returned no scriptId"))?
            .to_string();

        debug!(%script_id, "Error collector installed");
        *self.inner.collector_id.lock() = Some(script_id);
        Ok(())
    }

    /// Unregisters the error collector, if installed.
    pub async fn remove_error_collector(&self) -> Result<()> {
        let Some(script_id) = self.inner.collector_id.lock().take() else {
            return Ok(());
        };

        let command = Command::Script(ScriptCommand::RemovePreloadScript {
            script_id: script_id.clone(),
        });
        self.send_command(command).await?;
        debug!(%script_id, "Error collector removed");
        Ok(())
    }

    /// Moves errors recorded by the current document into the page buffer.
    pub(crate) async fn harvest_errors(&self) -> Result<()> {
        if self.inner.collector_id.lock().is_none() {
            return Ok(());
        }

        let script = format!(
            "/* nav-resolver:harvest */ \
             const errors = window.{ERRORS_KEY} || []; \
             window.{ERRORS_KEY} = []; \
             return errors;"
        );

        let messages: Vec<String> = match self.execute_script(&script).await {
            Ok(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Ok(_) => Vec::new(),
            Err(Error::ScriptError { message }) => {
                debug!(%message, "Error harvest skipped");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if !messages.is_empty() {
            debug!(count = messages.len(), "Harvested uncaught page errors");
            self.inner.harvested_errors.lock().extend(messages);
        }
        Ok(())
    }

    /// All uncaught errors collected since the last test setup.
    pub async fn collected_errors(&self) -> Result<Vec<String>> {
        self.harvest_errors().await?;
        Ok(self.inner.harvested_errors.lock().clone())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escapes a string for safe use in JavaScript.
pub(crate) fn json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn interceptor_script(id: &InterceptId, object_path: &str, method: &str) -> String {
    format!(
        r#"/* nav-resolver:intercept */
const path = {path}.split('.').filter(p => p && p !== 'window');
let target = window;
for (const key of path) {{
    target = target[key];
    if (target == null) {{ throw new Error('no object at ' + {path}); }}
}}
const store = window.{CALLS_KEY} || (window.{CALLS_KEY} = {{}});
const calls = [];
store[{id}] = calls;
target[{method}] = function (...args) {{
    let copy;
    try {{
        copy = JSON.parse(JSON.stringify(args));
    }} catch (e) {{
        copy = args.map(a => (a == null ? null : String(a)));
    }}
    calls.push(copy);
    return null;
}};
return true;"#,
        path = json_string(object_path),
        id = json_string(id.as_str()),
        method = json_string(method),
    )
}

fn collector_script() -> String {
    format!(
        r#"/* nav-resolver:errors */
window.{ERRORS_KEY} = [];
window.addEventListener('error', e => {{
    window.{ERRORS_KEY}.push(String(e.message || e.error));
}});
window.addEventListener('unhandledrejection', e => {{
    window.{ERRORS_KEY}.push('Unhandled rejection: ' + String(e.reason));
}});"#
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_string_escapes() {
        assert_eq!(json_string("a\"b"), r#""a\"b""#);
        assert_eq!(json_string("line\nbreak"), r#""line\nbreak""#);
    }

    #[test]
    fn test_interceptor_script_embeds_quoted_values() {
        let id = InterceptId::generate();
        let script = interceptor_script(&id, "window", "open");
        assert!(script.starts_with("/* nav-resolver:intercept */"));
        assert!(script.contains(&format!("store[\"{}\"] = calls;", id.as_str())));
        assert!(script.contains("target[\"open\"] = function"));
        assert!(script.contains(CALLS_KEY));
    }

    #[test]
    fn test_collector_script_listens_for_errors() {
        let script = collector_script();
        assert!(script.contains("addEventListener('error'"));
        assert!(script.contains("unhandledrejection"));
        assert!(script.contains(ERRORS_KEY));
    }
}
