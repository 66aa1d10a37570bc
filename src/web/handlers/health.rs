use salvo::prelude::*;

pub const LIVENESS_BODY: &str = "Discord bot is alive and running!";

/// Answers regardless of the gateway connection state.
#[handler]
pub async fn liveness(res: &mut Response) {
    res.render(Text::Plain(LIVENESS_BODY));
}
