use msgs::Address;
use session::ClientId;

#[derive(Debug, Clone)]
pub enum BroadcastMsg {
    /// An encoded frame for every client process whose session id `Address` includes.
    Send(Address, Vec<u8>),
    Kick(ClientId),
}
