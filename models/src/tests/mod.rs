mod handshake_payload;
mod listen_target;
