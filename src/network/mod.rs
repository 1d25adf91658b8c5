// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request execution
//!
//! Everything between an assembled request and a response: the middleware
//! chain, bounded retry and the transport that performs a single attempt.

pub mod middleware;
mod retry;
mod transport;

pub use middleware::{
    HeaderEntry, HeaderInjector, Middleware, MiddlewareChain, NetworkCall, Next, RequestLogger,
};
pub use retry::RetryExecutor;
pub use transport::{ReqwestTransport, SendFailure, Transport};
