// crates/capmesh-dispatch/src/lib.rs
// ============================================================================
// Module: capmesh-dispatch
// Description: Request dispatch from the router to capability services.
// Purpose: Resolve a catalog reference to a registered service and carry
//          the invocation over a pluggable transport.
// Dependencies: capmesh-core, capmesh-registry, async-trait, reqwest
// ============================================================================

//! ## Overview
//!
//! Dispatch is two small layers. [`InvocationTransport`] is the wire
//! seam: it moves a prepared request to a service address and returns the
//! reply. [`ToolInvokerProxy`] and [`ResourceAcquirerProxy`] sit above
//! it, resolving the reference type to a registered service and merging
//! advertised configuration with reference overrides before the call.

pub mod proxy;
pub mod transport;

pub use proxy::ResourceAcquirerProxy;
pub use proxy::ToolInvokerProxy;
pub use transport::CallReply;
pub use transport::HttpTransport;
pub use transport::InvocationTransport;
pub use transport::ResourceRequest;
pub use transport::ToolInvokeRequest;
