use scan_core::{Msg, SessionToken};
use tokio::sync::mpsc::UnboundedSender;

/// Where a decoder reports decoded symbols. Each sink is bound to the capture
/// session it was handed to, so reports arriving after the session ended are
/// recognisably stale.
#[derive(Debug, Clone)]
pub struct DecodeSink {
    token: SessionToken,
    tx: UnboundedSender<Msg>,
}

impl DecodeSink {
    pub fn new(token: SessionToken, tx: UnboundedSender<Msg>) -> Self {
        Self { token, tx }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Reports a decoded code. Safe to call any number of times, including
    /// after the decoder was asked to stop.
    pub fn decoded(&self, code: impl Into<String>) {
        let _ = self.tx.send(Msg::CodeDecoded {
            token: self.token,
            code: code.into(),
        });
    }
}

/// Callback-driven barcode decoding engine.
pub trait BarcodeDecoder: Send + Sync {
    fn start(&self, sink: DecodeSink);
    fn stop(&self);
}

/// Decoder that never reports anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDecoder;

impl BarcodeDecoder for NullDecoder {
    fn start(&self, _sink: DecodeSink) {}

    fn stop(&self) {}
}
