//! Request dispatcher and provider registry.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use bytes::Bytes;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::protocol::response::QueryResponse;

/// Opaque caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Create an address from its raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Capability interface a consumer registers per request.
///
/// The dispatcher hands itself back mutably, so a handler may submit
/// follow-up requests from within the callback.
pub trait OracleResultHandler {
    /// Receive the decoded response for a fulfilled request.
    fn handle_result(&mut self, oracle: &mut Oracle, response: &QueryResponse) -> Result<()>;
}

struct PendingRequest {
    consumer: Address,
    handler: Box<dyn OracleResultHandler>,
}

/// State transitions observable from the outside.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleEvent {
    RequestSubmitted {
        request_id: u64,
        consumer: Address,
        request_data: Bytes,
    },
    ResultProvided {
        request_id: u64,
        consumer: Address,
        provider: Address,
        result_data: Bytes,
        response_failed: bool,
        callback_failed: bool,
        callback_error: Bytes,
    },
    ProviderAdded {
        provider: Address,
    },
    ProviderRemoved {
        provider: Address,
    },
    Disabled,
}

/// Dispatcher owning all mutable protocol state.
///
/// Transactions are strictly sequential; every operation takes `&mut self`,
/// which encodes the serialization at the type level.
pub struct Oracle {
    owner: Address,
    enabled: bool,
    next_request_id: u64,
    pending: HashMap<u64, PendingRequest>,
    providers: HashSet<Address>,
    expose_callback_errors: bool,
    events: Vec<OracleEvent>,
}

impl Oracle {
    /// Create a dispatcher. Callback diagnostic payloads are redacted from
    /// emitted events.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            enabled: true,
            next_request_id: 1,
            pending: HashMap::new(),
            providers: HashSet::new(),
            expose_callback_errors: false,
            events: Vec::new(),
        }
    }

    /// Create a dispatcher that retains callback diagnostic payloads in its
    /// events.
    pub fn with_exposed_callback_errors(owner: Address) -> Self {
        Self {
            expose_callback_errors: true,
            ..Self::new(owner)
        }
    }

    /// The owning address.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Whether the dispatcher still accepts transactions.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of requests awaiting fulfillment.
    pub fn num_pending(&self) -> usize {
        self.pending.len()
    }

    /// Whether an address is in the provider allow-list.
    pub fn is_authorized(&self, provider: &Address) -> bool {
        self.providers.contains(provider)
    }

    /// Drain the accumulated event log.
    pub fn take_events(&mut self) -> Vec<OracleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Submit a query request. Returns the assigned request id; ids are
    /// allocated sequentially starting at 1 and never reused.
    pub fn send_request(
        &mut self,
        consumer: Address,
        request_data: Bytes,
        handler: Box<dyn OracleResultHandler>,
    ) -> Result<u64> {
        if !self.enabled {
            return Err(Error::ContractDisabled);
        }
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending
            .insert(request_id, PendingRequest { consumer, handler });
        info!(request_id, consumer = %consumer, "request submitted");
        self.events.push(OracleEvent::RequestSubmitted {
            request_id,
            consumer,
            request_data,
        });
        Ok(request_id)
    }

    /// Fulfill a pending request with an encoded response.
    ///
    /// The pending entry is removed before the handler runs, so a request
    /// is delivered at most once even if the handler re-enters the
    /// dispatcher. Handler failures, panics included, are contained and
    /// reported through the emitted event; they do not fail this call.
    pub fn provide_result(
        &mut self,
        provider: Address,
        request_id: u64,
        result_data: Bytes,
    ) -> Result<()> {
        if !self.enabled {
            return Err(Error::ContractDisabled);
        }
        if !self.providers.contains(&provider) {
            warn!(request_id, provider = %provider, "unauthorized fulfillment attempt");
            return Err(Error::UnauthorizedProvider { provider });
        }
        if !self.pending.contains_key(&request_id) {
            return Err(Error::RequestNotFound { request_id });
        }

        // decode before touching state: a malformed payload aborts with the
        // entry still pending
        let response = QueryResponse::from_bytes(request_id, &result_data)?;

        let mut entry = self
            .pending
            .remove(&request_id)
            .ok_or(Error::RequestNotFound { request_id })?;

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            entry.handler.handle_result(self, &response)
        }));
        let (callback_failed, diagnostic) = match outcome {
            Ok(Ok(())) => (false, Bytes::new()),
            Ok(Err(err)) => (true, Bytes::from(err.to_string())),
            Err(panic) => (true, Bytes::from(panic_message(panic.as_ref()))),
        };
        let response_failed = !response.ok();
        if callback_failed {
            warn!(request_id, provider = %provider, "result callback failed");
        } else {
            info!(request_id, provider = %provider, response_failed, "result provided");
        }
        let callback_error = if self.expose_callback_errors {
            diagnostic
        } else {
            Bytes::new()
        };
        self.events.push(OracleEvent::ResultProvided {
            request_id,
            consumer: entry.consumer,
            provider,
            result_data,
            response_failed,
            callback_failed,
            callback_error,
        });
        Ok(())
    }

    /// Authorize a provider. Owner only; adding a present provider is a
    /// no-op.
    pub fn add_provider(&mut self, caller: Address, provider: Address) -> Result<()> {
        self.require_owner(caller)?;
        if self.providers.insert(provider) {
            info!(provider = %provider, "provider added");
            self.events.push(OracleEvent::ProviderAdded { provider });
        }
        Ok(())
    }

    /// Revoke a provider. Owner only; removing an absent provider is a
    /// no-op.
    pub fn remove_provider(&mut self, caller: Address, provider: Address) -> Result<()> {
        self.require_owner(caller)?;
        if self.providers.remove(&provider) {
            info!(provider = %provider, "provider removed");
            self.events.push(OracleEvent::ProviderRemoved { provider });
        }
        Ok(())
    }

    /// Irreversibly stop accepting transactions. Owner only.
    pub fn disable(&mut self, caller: Address) -> Result<()> {
        self.require_owner(caller)?;
        if self.enabled {
            self.enabled = false;
            warn!("oracle disabled");
            self.events.push(OracleEvent::Disabled);
        }
        Ok(())
    }

    fn require_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(Error::OwnerOnly { caller });
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const OWNER: Address = Address([0x01; 20]);
    const CONSUMER: Address = Address([0x02; 20]);
    const PROVIDER: Address = Address([0x03; 20]);
    const STRANGER: Address = Address([0x04; 20]);

    struct NoopHandler;

    impl OracleResultHandler for NoopHandler {
        fn handle_result(&mut self, _: &mut Oracle, _: &QueryResponse) -> Result<()> {
            Ok(())
        }
    }

    struct RecordingHandler {
        seen: Rc<RefCell<Vec<u64>>>,
    }

    impl OracleResultHandler for RecordingHandler {
        fn handle_result(&mut self, _: &mut Oracle, response: &QueryResponse) -> Result<()> {
            self.seen.borrow_mut().push(response.request_id());
            Ok(())
        }
    }

    fn success_bytes() -> Bytes {
        // [1, true, []]
        Bytes::from_static(&[0x9f, 0x01, 0xf5, 0x9f, 0xff, 0xff])
    }

    fn error_bytes() -> Bytes {
        // [1, false, "no"]
        Bytes::from_static(&[0x9f, 0x01, 0xf4, 0x62, 0x6e, 0x6f, 0xff])
    }

    fn oracle_with_provider() -> Oracle {
        let mut oracle = Oracle::new(OWNER);
        oracle.add_provider(OWNER, PROVIDER).unwrap();
        oracle
    }

    #[test]
    fn test_sequential_request_ids() {
        let mut oracle = Oracle::new(OWNER);
        let first = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(NoopHandler))
            .unwrap();
        let second = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(NoopHandler))
            .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(oracle.num_pending(), 2);
    }

    #[test]
    fn test_fulfillment_is_at_most_once() {
        let mut oracle = oracle_with_provider();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let id = oracle
            .send_request(
                CONSUMER,
                Bytes::new(),
                Box::new(RecordingHandler { seen: seen.clone() }),
            )
            .unwrap();

        oracle.provide_result(PROVIDER, id, success_bytes()).unwrap();
        assert_eq!(*seen.borrow(), vec![id]);
        assert_eq!(oracle.num_pending(), 0);

        let err = oracle.provide_result(PROVIDER, id, success_bytes()).unwrap_err();
        assert!(matches!(err, Error::RequestNotFound { request_id } if request_id == id));
        assert_eq!(*seen.borrow(), vec![id]);
    }

    #[test]
    fn test_unauthorized_provider_leaves_request_pending() {
        let mut oracle = oracle_with_provider();
        let id = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(NoopHandler))
            .unwrap();

        let err = oracle.provide_result(STRANGER, id, success_bytes()).unwrap_err();
        assert!(matches!(err, Error::UnauthorizedProvider { provider } if provider == STRANGER));
        assert_eq!(oracle.num_pending(), 1);

        // a later authorized provider can still fulfill it
        oracle.provide_result(PROVIDER, id, success_bytes()).unwrap();
        assert_eq!(oracle.num_pending(), 0);
    }

    #[test]
    fn test_malformed_payload_mutates_nothing() {
        let mut oracle = oracle_with_provider();
        let id = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(NoopHandler))
            .unwrap();
        oracle.take_events();

        let err = oracle
            .provide_result(PROVIDER, id, Bytes::from_static(&[0x01]))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
        assert_eq!(oracle.num_pending(), 1);
        assert!(oracle.take_events().is_empty());
    }

    struct ReentrantHandler;

    impl OracleResultHandler for ReentrantHandler {
        fn handle_result(&mut self, oracle: &mut Oracle, _: &QueryResponse) -> Result<()> {
            oracle.send_request(CONSUMER, Bytes::new(), Box::new(NoopHandler))?;
            Ok(())
        }
    }

    #[test]
    fn test_reentrant_submission_from_callback() {
        let mut oracle = oracle_with_provider();
        let id = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(ReentrantHandler))
            .unwrap();

        oracle.provide_result(PROVIDER, id, success_bytes()).unwrap();
        // the callback's follow-up request got the next id and is pending
        assert_eq!(oracle.num_pending(), 1);
        let err = oracle.provide_result(PROVIDER, id, success_bytes()).unwrap_err();
        assert!(matches!(err, Error::RequestNotFound { .. }));
        oracle.provide_result(PROVIDER, id + 1, success_bytes()).unwrap();
        assert_eq!(oracle.num_pending(), 0);
    }

    struct FailingHandler;

    impl OracleResultHandler for FailingHandler {
        fn handle_result(&mut self, _: &mut Oracle, _: &QueryResponse) -> Result<()> {
            Err(Error::handler("consumer rejected the result"))
        }
    }

    struct PanickingHandler;

    impl OracleResultHandler for PanickingHandler {
        fn handle_result(&mut self, _: &mut Oracle, _: &QueryResponse) -> Result<()> {
            panic!("handler exploded");
        }
    }

    #[test]
    fn test_callback_error_is_contained() {
        let mut oracle = oracle_with_provider();
        let id = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(FailingHandler))
            .unwrap();
        oracle.take_events();

        oracle.provide_result(PROVIDER, id, success_bytes()).unwrap();
        let events = oracle.take_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            OracleEvent::ResultProvided {
                callback_failed,
                callback_error,
                response_failed,
                ..
            } => {
                assert!(*callback_failed);
                assert!(!*response_failed);
                // redacted by default
                assert!(callback_error.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }

        // the dispatcher stays usable
        let next = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(NoopHandler))
            .unwrap();
        oracle.provide_result(PROVIDER, next, success_bytes()).unwrap();
    }

    #[test]
    fn test_callback_panic_is_contained() {
        let mut oracle = oracle_with_provider();
        let id = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(PanickingHandler))
            .unwrap();

        oracle.provide_result(PROVIDER, id, success_bytes()).unwrap();
        assert_eq!(oracle.num_pending(), 0);

        let next = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(NoopHandler))
            .unwrap();
        assert_eq!(next, 2);
    }

    #[test]
    fn test_exposed_callback_errors() {
        let mut oracle = Oracle::with_exposed_callback_errors(OWNER);
        oracle.add_provider(OWNER, PROVIDER).unwrap();
        let id = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(FailingHandler))
            .unwrap();
        oracle.take_events();

        oracle.provide_result(PROVIDER, id, success_bytes()).unwrap();
        let events = oracle.take_events();
        match &events[0] {
            OracleEvent::ResultProvided { callback_error, .. } => {
                assert!(!callback_error.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_failed_response_flag() {
        let mut oracle = oracle_with_provider();
        let id = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(NoopHandler))
            .unwrap();
        oracle.take_events();

        oracle.provide_result(PROVIDER, id, error_bytes()).unwrap();
        match &oracle.take_events()[0] {
            OracleEvent::ResultProvided {
                response_failed,
                callback_failed,
                ..
            } => {
                assert!(*response_failed);
                assert!(!*callback_failed);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_provider_registry_is_owner_gated() {
        let mut oracle = Oracle::new(OWNER);
        let err = oracle.add_provider(STRANGER, PROVIDER).unwrap_err();
        assert!(matches!(err, Error::OwnerOnly { caller } if caller == STRANGER));
        assert!(!oracle.is_authorized(&PROVIDER));

        oracle.add_provider(OWNER, PROVIDER).unwrap();
        assert!(oracle.is_authorized(&PROVIDER));
        // re-adding emits nothing
        oracle.take_events();
        oracle.add_provider(OWNER, PROVIDER).unwrap();
        assert!(oracle.take_events().is_empty());

        oracle.remove_provider(OWNER, PROVIDER).unwrap();
        assert!(!oracle.is_authorized(&PROVIDER));
        oracle.take_events();
        oracle.remove_provider(OWNER, PROVIDER).unwrap();
        assert!(oracle.take_events().is_empty());
    }

    #[test]
    fn test_disable_kills_both_paths() {
        let mut oracle = oracle_with_provider();
        let id = oracle
            .send_request(CONSUMER, Bytes::new(), Box::new(NoopHandler))
            .unwrap();

        let err = oracle.disable(STRANGER).unwrap_err();
        assert!(matches!(err, Error::OwnerOnly { .. }));
        assert!(oracle.is_enabled());

        oracle.disable(OWNER).unwrap();
        assert!(!oracle.is_enabled());
        assert!(matches!(
            oracle.send_request(CONSUMER, Bytes::new(), Box::new(NoopHandler)),
            Err(Error::ContractDisabled)
        ));
        assert!(matches!(
            oracle.provide_result(PROVIDER, id, success_bytes()),
            Err(Error::ContractDisabled)
        ));
    }

    #[test]
    fn test_event_log_order() {
        let mut oracle = Oracle::new(OWNER);
        oracle.add_provider(OWNER, PROVIDER).unwrap();
        let id = oracle
            .send_request(CONSUMER, Bytes::from_static(b"req"), Box::new(NoopHandler))
            .unwrap();
        oracle.provide_result(PROVIDER, id, success_bytes()).unwrap();
        oracle.disable(OWNER).unwrap();

        let events = oracle.take_events();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], OracleEvent::ProviderAdded { .. }));
        assert!(matches!(
            events[1],
            OracleEvent::RequestSubmitted { request_id: 1, .. }
        ));
        assert!(matches!(
            events[2],
            OracleEvent::ResultProvided { request_id: 1, .. }
        ));
        assert!(matches!(events[3], OracleEvent::Disabled));
        assert!(oracle.take_events().is_empty());
    }

    #[test]
    fn test_address_display() {
        assert_eq!(
            OWNER.to_string(),
            format!("0x{}", "01".repeat(20))
        );
    }
}
