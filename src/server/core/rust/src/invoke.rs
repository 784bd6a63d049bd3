/* src/server/core/rust/src/invoke.rs */

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use crate::context::{Outcome, RequestContext};
use crate::errors::{BoxError, TrellisError};
use crate::module::{HandlerFn, ModuleCache};
use crate::page::LoaderResult;
use crate::route::{RouteDefinition, RouteKind};

/// Run the route's handler (API) or loader (page) and check the shape of
/// what it returned.
///
/// API routes must produce `Outcome::Response` or `Outcome::Redirect`.
/// Page routes must produce `Outcome::Loaded` or `Outcome::Redirect`; a
/// loaded result that carries a redirect is returned as `Outcome::Redirect`.
/// A page without a loader behaves as if it returned an empty result.
pub async fn invoke(
  cache: &ModuleCache,
  route: &RouteDefinition,
  ctx: RequestContext,
) -> Result<Outcome, TrellisError> {
  let label = route.pattern().to_string();
  let module = route.exports(cache)?;

  match route.kind() {
    RouteKind::Api => {
      let Some(handler) = module.exports.handlers.get(ctx.method()).cloned() else {
        return Err(TrellisError::MethodNotAllowed {
          route: label,
          method: ctx.method().clone(),
          allowed: module.exports.allowed_methods(),
        });
      };
      drop(module);
      match run(&label, &handler, ctx).await? {
        Outcome::Response(response) if !(100..=599).contains(&response.status_code) => {
          Err(TrellisError::contract(
            label,
            format!("status code {} is out of range", response.status_code),
          ))
        }
        outcome @ (Outcome::Response(_) | Outcome::Redirect(_)) => Ok(outcome),
        Outcome::Loaded(_) => {
          Err(TrellisError::contract(label, "API handler returned loader data instead of a response"))
        }
      }
    }
    RouteKind::Page => {
      let Some(loader) = module.exports.loader.clone() else {
        return Ok(Outcome::Loaded(LoaderResult::new()));
      };
      drop(module);
      match run(&label, &loader, ctx).await? {
        Outcome::Loaded(LoaderResult { redirect: Some(redirect), .. }) => {
          Ok(Outcome::Redirect(redirect))
        }
        outcome @ (Outcome::Loaded(_) | Outcome::Redirect(_)) => Ok(outcome),
        Outcome::Response(_) => {
          Err(TrellisError::contract(label, "page loader returned a response instead of loader data"))
        }
      }
    }
  }
}

/// Await a handler, turning both returned errors and panics into
/// `HandlerExecution` with the cause preserved.
async fn run(label: &str, f: &HandlerFn, ctx: RequestContext) -> Result<Outcome, TrellisError> {
  let fut = f(ctx);
  match AssertUnwindSafe(fut).catch_unwind().await {
    Ok(Ok(outcome)) => Ok(outcome),
    Ok(Err(source)) => Err(TrellisError::HandlerExecution { route: label.to_string(), source }),
    Err(payload) => Err(TrellisError::HandlerExecution {
      route: label.to_string(),
      source: panic_message(payload.as_ref()),
    }),
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> BoxError {
  let msg = payload
    .downcast_ref::<&str>()
    .map(|s| (*s).to_string())
    .or_else(|| payload.downcast_ref::<String>().cloned())
    .unwrap_or_else(|| "handler panicked".to_string());
  format!("panic: {msg}").into()
}
