#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Follow { channel: String },
    Unfollow { channel: String },
    SendMessage { channel: String, text: String },
    Quit,
}
