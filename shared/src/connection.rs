/// Byte buffers for one stream connection.
///
/// The transport appends whatever arrives to `recv_buffer` and ships whatever
/// accumulates in `send_buffer`; the message codecs only ever touch these two
/// buffers, so decoding never blocks on the socket.
#[derive(Debug, Default, Clone)]
pub struct Connection {
    pub send_buffer: Vec<u8>,
    pub recv_buffer: Vec<u8>,
}

impl Connection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues bytes for sending.
    pub fn send(&mut self, bytes: &[u8]) {
        self.send_buffer.extend_from_slice(bytes);
    }

    /// Appends bytes read from the socket.
    pub fn receive(&mut self, bytes: &[u8]) {
        self.recv_buffer.extend_from_slice(bytes);
    }

    pub fn has_outgoing(&self) -> bool {
        !self.send_buffer.is_empty()
    }

    /// Hands the queued outgoing bytes to the transport.
    pub fn take_outgoing(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.send_buffer)
    }
}
