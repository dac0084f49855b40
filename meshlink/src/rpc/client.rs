//! Client-side typed call dispatch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::context::Context;
use super::error::{CallError, TransportError};
use super::method::Method;
use super::outcome::{Outcome, WireOutcome};
use super::payload::Payload;
use super::transport::{Reply, Transport};
use crate::peers::{PeerAddress, PeerDirectory, PeerList};

/// Typed call dispatcher bound to one service.
///
/// Peers come from the shared [`PeerDirectory`]; each call takes a fresh
/// snapshot and rotates through it. The client never retries: every
/// transport failure is returned to the caller.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    directory: PeerDirectory,
    service: Arc<str>,
    cursor: Arc<AtomicUsize>,
}

impl Client {
    /// Creates a client for `service`.
    pub fn new(
        transport: Arc<dyn Transport>,
        directory: PeerDirectory,
        service: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            directory,
            service: Arc::from(service.into()),
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns a client for another service sharing this transport and
    /// directory.
    #[must_use]
    pub fn for_service(&self, service: impl Into<String>) -> Self {
        Self::new(Arc::clone(&self.transport), self.directory.clone(), service)
    }

    /// Service this client calls.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Peers of this client's service.
    #[must_use]
    pub fn peers(&self) -> PeerList {
        self.directory.service(&self.service)
    }

    /// Calls `M` and flattens the outcome: declared exceptions become
    /// [`CallError::Exception`].
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Exception`] when the handler raised a declared
    /// exception and [`CallError::Transport`] when the call itself failed.
    pub async fn call<M: Method>(
        &self,
        ctx: &Context,
        args: &M::Args,
    ) -> Result<M::Success, CallError<M::Exception>> {
        match self.call_outcome::<M>(ctx, args).await? {
            Outcome::Success(value) => Ok(value),
            Outcome::Exception(err) => Err(CallError::Exception(err)),
        }
    }

    /// Calls `M` and returns the typed outcome.
    ///
    /// The whole round trip is bounded by the context deadline.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no peer is known, the deadline
    /// passes, the transport fails, or the reply does not decode.
    pub async fn call_outcome<M: Method>(
        &self,
        ctx: &Context,
        args: &M::Args,
    ) -> Result<Outcome<M::Success, M::Exception>, TransportError> {
        let result = self.round_trip::<M>(ctx, args).await;
        let label = match &result {
            Ok(Outcome::Success(_)) => "ok",
            Ok(Outcome::Exception(_)) => "exception",
            Err(_) => "error",
        };
        metrics::counter!(
            "meshlink_client_calls_total",
            "service" => self.service.to_string(),
            "method" => M::NAME,
            "result" => label
        )
        .increment(1);
        result
    }

    async fn round_trip<M: Method>(
        &self,
        ctx: &Context,
        args: &M::Args,
    ) -> Result<Outcome<M::Success, M::Exception>, TransportError> {
        let peer = self.select_peer()?;
        let payload = Payload::encode(args).map_err(|e| TransportError::Encode(e.to_string()))?;

        debug!(
            service = %self.service,
            method = M::NAME,
            peer = %peer,
            call_id = %ctx.call_id(),
            "Sending call"
        );

        let call = self
            .transport
            .call(ctx, &peer, &self.service, M::NAME, payload);
        let reply = tokio::time::timeout_at(ctx.deadline(), call)
            .await
            .map_err(|_| TransportError::Timeout {
                service: self.service.to_string(),
                method: M::NAME.to_string(),
            })??;

        decode_reply::<M>(reply)
    }

    fn select_peer(&self) -> Result<PeerAddress, TransportError> {
        let peers = self.directory.peers(&self.service);
        if peers.is_empty() {
            return Err(TransportError::NoPeers {
                service: self.service.to_string(),
            });
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % peers.len();
        Ok(peers[index].clone())
    }
}

fn decode_reply<M: Method>(
    reply: Reply,
) -> Result<Outcome<M::Success, M::Exception>, TransportError> {
    let wire: WireOutcome = reply
        .body
        .decode()
        .map_err(|e| TransportError::MalformedReply(e.to_string()))?;
    if wire.is_success() != reply.ok {
        return Err(TransportError::MalformedReply(
            "reply status disagrees with its body".to_string(),
        ));
    }
    wire.decode::<M::Success, M::Exception>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{NoException, ServiceBuilder, Server};
    use crate::rpc::transport::LoopbackNetwork;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct EchoArgs {
        text: String,
    }

    struct Echo;

    impl Method for Echo {
        const NAME: &'static str = "echo";
        type Args = EchoArgs;
        type Success = String;
        type Exception = NoException;
    }

    /// Records which peers were dialed and answers every call with `reply`.
    struct Recorder {
        dialed: Mutex<Vec<String>>,
        reply: Reply,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn call(
            &self,
            _ctx: &Context,
            peer: &PeerAddress,
            _service: &str,
            _method: &str,
            _args: Payload,
        ) -> Result<Reply, TransportError> {
            self.dialed.lock().push(peer.to_string());
            Ok(self.reply.clone())
        }
    }

    struct Stalled;

    #[async_trait]
    impl Transport for Stalled {
        async fn call(
            &self,
            _ctx: &Context,
            _peer: &PeerAddress,
            _service: &str,
            _method: &str,
            _args: Payload,
        ) -> Result<Reply, TransportError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(TransportError::Network("unreachable".to_string()))
        }
    }

    fn ok_reply(value: &str) -> Reply {
        Reply {
            ok: true,
            body: Payload::encode(&WireOutcome::Success(serde_json::json!(value))).unwrap(),
        }
    }

    fn ctx() -> Context {
        Context::with_timeout(Duration::from_secs(1))
    }

    fn directory_with(peers: &[&str]) -> PeerDirectory {
        let directory = PeerDirectory::new();
        for peer in peers {
            directory.add("Echo", PeerAddress::new(peer).unwrap());
        }
        directory
    }

    #[tokio::test]
    async fn call_without_peers_should_fail_fast() {
        let client = Client::new(
            Arc::new(LoopbackNetwork::new()),
            PeerDirectory::new(),
            "Echo",
        );
        let err = client
            .call::<Echo>(&ctx(), &EchoArgs { text: "hi".into() })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::Transport(TransportError::NoPeers { ref service }) if service == "Echo"
        ));
    }

    #[tokio::test]
    async fn calls_should_rotate_across_peers() {
        let recorder = Arc::new(Recorder {
            dialed: Mutex::new(Vec::new()),
            reply: ok_reply("hi"),
        });
        let client = Client::new(
            recorder.clone(),
            directory_with(&["10.0.0.1:1", "10.0.0.2:1"]),
            "Echo",
        );

        for _ in 0..4 {
            client
                .call::<Echo>(&ctx(), &EchoArgs { text: "hi".into() })
                .await
                .unwrap();
        }
        assert_eq!(
            *recorder.dialed.lock(),
            vec!["10.0.0.1:1", "10.0.0.2:1", "10.0.0.1:1", "10.0.0.2:1"]
        );
    }

    #[tokio::test]
    async fn status_flag_disagreeing_with_body_should_be_malformed() {
        let mut reply = ok_reply("hi");
        reply.ok = false;
        let client = Client::new(
            Arc::new(Recorder {
                dialed: Mutex::new(Vec::new()),
                reply,
            }),
            directory_with(&["10.0.0.1:1"]),
            "Echo",
        );
        let err = client
            .call_outcome::<Echo>(&ctx(), &EchoArgs { text: "hi".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::MalformedReply(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_should_be_a_timeout() {
        let client = Client::new(Arc::new(Stalled), directory_with(&["10.0.0.1:1"]), "Echo");
        let err = client
            .call::<Echo>(&ctx(), &EchoArgs { text: "hi".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Transport(ref t) if t.is_timeout()));
    }

    #[tokio::test]
    async fn arguments_should_reach_the_handler_unchanged() {
        let network = LoopbackNetwork::new();
        let address = PeerAddress::new("127.0.0.1:7000").unwrap();
        let service = ServiceBuilder::new("Echo")
            .method::<Echo, _, _>(|_ctx, args: EchoArgs| async move { Ok(args.text.to_uppercase()) })
            .build()
            .unwrap();
        network.listen(address.clone(), Arc::new(Server::new().with_service(service)));

        let directory = PeerDirectory::new();
        let client = Client::new(Arc::new(network), directory, "Echo");
        assert!(client.peers().add(address));

        let args = EchoArgs {
            text: "quiet".to_string(),
        };
        let answer = client.call::<Echo>(&ctx(), &args).await.unwrap();
        assert_eq!(answer, "QUIET");
        assert_eq!(args.text, "quiet");
    }

    #[test]
    fn for_service_should_share_the_directory() {
        let directory = directory_with(&["10.0.0.1:1"]);
        let client = Client::new(Arc::new(LoopbackNetwork::new()), directory.clone(), "Echo");
        let other = client.for_service("Other");
        other.peers().add(PeerAddress::new("10.0.0.9:1").unwrap());

        assert_eq!(other.service(), "Other");
        assert_eq!(directory.peers("Other").len(), 1);
        assert_eq!(client.peers().len(), 1);
    }
}
