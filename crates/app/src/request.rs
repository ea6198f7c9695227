/// An owned unit of request text.
///
/// Exactly one owner at any time: the front end constructs it, the queue
/// carries it, the synthesis worker consumes it. Deliberately not `Clone`;
/// moving it through the channel makes use-after-handoff unrepresentable.
#[derive(Debug)]
pub struct SpeechRequest {
    pub id: u64,
    pub text: String,
}
