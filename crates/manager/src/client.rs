use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use windfarm_common::framing::{read_frame, write_frame};
use windfarm_common::protocol::{Request, Response};
use windfarm_common::{auth, ManagerError, Slot, Value};

const CONNECT_ATTEMPTS: u32 = 10;
const CONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// A Manager client session. Grounded on `manager/manager/__init__.py`'s
/// `Client`: same identity string, same 10-attempt/1-second reconnection
/// policy, same "initialize `logs` if absent" post-connect step, same
/// transparent-retry-on-disconnect behaviour for `get_ns`-equivalent calls.
pub struct Client {
    name: String,
    host: String,
    port: u16,
    authkey: Vec<u8>,
    conn: Mutex<Option<TcpStream>>,
}

impl Client {
    /// Connects to the manager, retrying per the reconnection policy, and
    /// ensures the `logs` slot exists.
    pub async fn connect(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        authkey: Vec<u8>,
    ) -> Result<Client, ManagerError> {
        let name = name.into();
        let host = host.into();
        let stream = Self::connect_with_retry(&name, &host, port, &authkey).await?;
        let client = Client {
            name,
            host,
            port,
            authkey,
            conn: Mutex::new(Some(stream)),
        };
        if client.get_slot(Slot::Logs).await?.is_none() {
            client.set_slot(Slot::Logs, Value::Array(Vec::new())).await?;
        }
        Ok(client)
    }

    async fn connect_with_retry(
        name: &str,
        host: &str,
        port: u16,
        authkey: &[u8],
    ) -> Result<TcpStream, ManagerError> {
        let addr = format!("{host}:{port}");
        for attempt in 0..CONNECT_ATTEMPTS {
            match Self::handshake(&addr, authkey).await {
                Ok(mut stream) => {
                    Self::send_request(
                        &mut stream,
                        Request::OnConnect { client: name.to_string() },
                    )
                    .await?;
                    info!("Connected to manager as \"{name}\"");
                    return Ok(stream);
                }
                Err(_) => {
                    warn!(
                        "Failed to connect to manager, attempt {}/{}",
                        attempt + 1,
                        CONNECT_ATTEMPTS
                    );
                    sleep(CONNECT_BACKOFF).await;
                }
            }
        }
        Err(ManagerError::Unreachable(addr))
    }

    async fn handshake(addr: &str, authkey: &[u8]) -> Result<TcpStream, ManagerError> {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|_| ManagerError::Unreachable(addr.to_string()))?;
        let nonce = read_frame(&mut stream).await?;
        let response = auth::compute_response(authkey, &nonce);
        write_frame(&mut stream, &response).await?;
        let verdict = read_frame(&mut stream).await?;
        if verdict != b"ok" {
            return Err(ManagerError::AuthFailed);
        }
        Ok(stream)
    }

    async fn send_request(stream: &mut TcpStream, request: Request) -> Result<Response, ManagerError> {
        let payload = serde_json::to_vec(&request)?;
        write_frame(stream, &payload).await?;
        let resp_bytes = read_frame(stream).await?;
        let response: Response = serde_json::from_slice(&resp_bytes)?;
        Ok(response)
    }

    /// Issues `request`, transparently reconnecting once on a transport
    /// error, mirroring the original `get_ns`'s single-retry-on-
    /// `ConnectionRefusedError` behaviour.
    async fn call(&self, request: Request) -> Result<Response, ManagerError> {
        let mut guard = self.conn.lock().await;
        if let Some(stream) = guard.as_mut() {
            if let Ok(resp) = Self::send_request(stream, request.clone()).await {
                return Ok(resp);
            }
        }
        let stream = Self::connect_with_retry(&self.name, &self.host, self.port, &self.authkey).await?;
        *guard = Some(stream);
        Self::send_request(guard.as_mut().unwrap(), request).await
    }

    pub async fn get_slot(&self, slot: Slot) -> Result<Option<Value>, ManagerError> {
        match self.call(Request::GetSlot { client: self.name.clone(), slot }).await? {
            Response::Value { value } => Ok(value),
            Response::Err { message } => Err(ManagerError::Protocol(message)),
            Response::Ok => Err(ManagerError::Protocol("unexpected Ok response to GetSlot".into())),
        }
    }

    pub async fn set_slot(&self, slot: Slot, value: Value) -> Result<(), ManagerError> {
        match self.call(Request::SetSlot { client: self.name.clone(), slot, value }).await? {
            Response::Ok => Ok(()),
            Response::Err { message } => Err(ManagerError::Protocol(message)),
            Response::Value { .. } => Err(ManagerError::Protocol("unexpected Value response to SetSlot".into())),
        }
    }

    pub async fn append_slot(&self, slot: Slot, entry: Value) -> Result<(), ManagerError> {
        match self
            .call(Request::AppendSlot { client: self.name.clone(), slot, entry })
            .await?
        {
            Response::Ok => Ok(()),
            Response::Err { message } => Err(ManagerError::Protocol(message)),
            Response::Value { .. } => Err(ManagerError::Protocol("unexpected Value response to AppendSlot".into())),
        }
    }

    /// Appends a structured entry to the `logs` slot, matching
    /// `manager/manager/__init__.py::Client.log`'s `{msg, level,
    /// time_seconds}` shape, but via the atomic server-side append instead
    /// of a client-side read-modify-write.
    pub async fn log(&self, msg: &str, level: &str) -> Result<(), ManagerError> {
        let time_seconds = self.get_slot(Slot::TimeSeconds).await?.and_then(|v| v.as_f64()).unwrap_or(0.0);
        let entry = windfarm_common::value_object! {
            "msg" => msg,
            "level" => level,
            "time_seconds" => time_seconds,
        };
        self.append_slot(Slot::Logs, entry).await
    }

    /// Polls until `slot` is present, sleeping 100ms between attempts, per
    /// the scheduler's only unbounded wait (startup rendezvous on `map_cfg`).
    pub async fn wait_for_slot(&self, slot: Slot) -> Result<Value, ManagerError> {
        loop {
            if let Some(v) = self.get_slot(slot).await? {
                return Ok(v);
            }
            sleep(Duration::from_millis(100)).await;
        }
    }

    pub async fn disconnect(&self) {
        let mut guard = self.conn.lock().await;
        if let Some(stream) = guard.as_mut() {
            let _ = Self::send_request(stream, Request::OnDisconnect { client: self.name.clone() }).await;
        }
        *guard = None;
    }
}
