use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use windfarm_common::framing::{read_frame, write_frame};
use windfarm_common::protocol::{Request, Response};
use windfarm_common::{auth, Slot, Value};

use crate::namespace::{Namespace, SharedNamespace};

pub struct Server {
    host: String,
    port: u16,
    authkey: Vec<u8>,
    ns: SharedNamespace,
}

impl Server {
    pub fn new(host: impl Into<String>, port: u16, authkey: Vec<u8>) -> Self {
        Server {
            host: host.into(),
            port,
            authkey,
            ns: Namespace::new(),
        }
    }

    pub fn namespace(&self) -> SharedNamespace {
        self.ns.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        info!("Attempting to create manager at {addr}");
        let listener = TcpListener::bind(&addr).await?;
        info!("Success");
        tokio::spawn(run_clock(self.ns.clone()));
        loop {
            let (socket, peer) = listener.accept().await?;
            debug!("Accepted connection from {peer}");
            let ns = self.ns.clone();
            let authkey = self.authkey.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(socket, ns, authkey).await {
                    warn!("Session with {peer} ended: {e}");
                }
            });
        }
    }
}

/// Maintains the `time_seconds` slot as a monotonically increasing
/// wall-clock-seconds counter, incremented once a second independently of
/// any client request. Clients read it for `logs` timestamps and the
/// Scheduler's tick-delta; nothing else writes it.
async fn run_clock(ns: SharedNamespace) {
    let mut ticker = interval(Duration::from_secs(1));
    let mut elapsed: f64 = 0.0;
    ns.set(Slot::TimeSeconds, Value::Number(elapsed)).await;
    loop {
        ticker.tick().await;
        elapsed += 1.0;
        ns.set(Slot::TimeSeconds, Value::Number(elapsed)).await;
    }
}

async fn handle_connection<S>(mut socket: S, ns: SharedNamespace, authkey: Vec<u8>) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let nonce = auth::generate_nonce();
    write_frame(&mut socket, &nonce).await?;
    let response = read_frame(&mut socket).await?;
    if !auth::verify_response(&authkey, &nonce, &response) {
        warn!("Rejected client: authentication failed");
        write_frame(&mut socket, b"auth_failed").await?;
        return Ok(());
    }
    write_frame(&mut socket, b"ok").await?;

    loop {
        let frame = match read_frame(&mut socket).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let request: Request = serde_json::from_slice(&frame)?;
        let response = dispatch(&ns, request).await;
        let payload = serde_json::to_vec(&response)?;
        write_frame(&mut socket, &payload).await?;
    }
}

async fn dispatch(ns: &SharedNamespace, request: Request) -> Response {
    match request {
        Request::GetSlot { slot, .. } => {
            let value = ns.get(slot).await;
            Response::Value { value }
        }
        Request::SetSlot { slot, value, .. } => {
            ns.set(slot, value).await;
            Response::Ok
        }
        Request::AppendSlot { slot, entry, .. } => {
            if !slot.appendable() {
                return Response::Err {
                    message: format!("slot {slot} does not support append"),
                };
            }
            ns.append(slot, entry).await;
            Response::Ok
        }
        Request::OnConnect { client } => {
            info!("Client \"{client}\" connected");
            Response::Ok
        }
        Request::OnDisconnect { client } => {
            info!("Client \"{client}\" disconnected");
            Response::Ok
        }
    }
}
