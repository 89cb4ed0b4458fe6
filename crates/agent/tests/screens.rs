use std::sync::Arc;
use std::time::Duration;

use guidepost_agent::{ChatStep, CopilotChat, MockBusinessSystems, OrderScreen, PacingProfile};
use guidepost_agent::chat::{CHAT_ANALYZING_NOTICE, SCRIPTED_REPLY};
use guidepost_core::config::PlayerConfig;
use guidepost_core::domain::order::{OrderField, ShipmentMethod};
use guidepost_core::fixtures::FixtureSet;
use guidepost_core::intents::FALLBACK_REPLY;
use tokio::time::Instant;

fn order_screen() -> OrderScreen {
    let pacing = PacingProfile::from(&PlayerConfig::default());
    OrderScreen::new(FixtureSet::demo().sales_order, pacing.highlight_clear)
}

fn paced_chat() -> Arc<CopilotChat> {
    let fixtures = Arc::new(FixtureSet::demo());
    let systems = Arc::new(MockBusinessSystems::new(Arc::clone(&fixtures)));
    Arc::new(CopilotChat::new(fixtures, systems, PacingProfile::default()))
}

#[tokio::test(start_paused = true)]
async fn courier_request_switches_method_and_highlight_clears_after_three_seconds() {
    let mut screen = order_screen();
    assert_eq!(screen.metadata().shipment_method.code(), "DELIVERY");

    screen.submit("please switch shipment to courier").expect("recognized");
    assert_eq!(screen.metadata().shipment_method, ShipmentMethod::Courier);
    assert_eq!(screen.highlighted(), Some(OrderField::ShipmentMethod));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(screen.highlighted(), Some(OrderField::ShipmentMethod));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(screen.highlighted(), None);
}

#[tokio::test(start_paused = true)]
async fn settle_waits_for_the_highlight_window() {
    let mut screen = order_screen();
    screen.submit("set the load time to 7 am").expect("recognized");

    let started = Instant::now();
    screen.settle().await;
    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert_eq!(screen.highlighted(), None);
    assert_eq!(screen.metadata().load_in_time, "7:00 AM");
}

#[test]
fn unrecognized_order_command_gets_the_fallback() {
    let mut screen = order_screen();
    for input in ["what's the weather", "ship it by courier", "time to go"] {
        assert!(screen.submit(input).is_none(), "{input}");
        let reply = screen.messages().last().expect("reply");
        assert_eq!(reply.content, FALLBACK_REPLY);
    }
}

#[tokio::test(start_paused = true)]
async fn chat_opening_pauses_before_querying() {
    let chat = paced_chat();
    let opening = {
        let chat = Arc::clone(&chat);
        tokio::spawn(async move { chat.open().await })
    };

    tokio::time::sleep(Duration::from_millis(1000)).await;
    let messages = chat.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, CHAT_ANALYZING_NOTICE);

    opening.await.expect("joins").expect("opened");
    assert_eq!(chat.step(), ChatStep::Overview);
}

#[tokio::test(start_paused = true)]
async fn chat_free_text_thinks_then_replies() {
    let chat = paced_chat();
    let mut thinking = chat.subscribe_thinking();
    let reply = {
        let chat = Arc::clone(&chat);
        tokio::spawn(async move { chat.say("Can we expedite?").await })
    };

    thinking.changed().await.expect("thinking starts");
    assert!(*thinking.borrow());
    let started = Instant::now();
    thinking.changed().await.expect("thinking ends");
    assert!(started.elapsed() >= Duration::from_millis(1500));

    reply.await.expect("joins").expect("replied");
    assert_eq!(chat.messages().last().map(|message| message.content.clone()), Some(SCRIPTED_REPLY.to_owned()));
}

#[tokio::test(start_paused = true)]
async fn chat_reset_cancels_the_opening() {
    let chat = paced_chat();
    let opening = {
        let chat = Arc::clone(&chat);
        tokio::spawn(async move { chat.open().await })
    };

    tokio::time::sleep(Duration::from_millis(500)).await;
    chat.reset();
    assert!(opening.await.expect("joins").is_err());
    assert!(chat.messages().is_empty());
    assert_eq!(chat.step(), ChatStep::NotStarted);
}

#[tokio::test(start_paused = true)]
async fn streamed_replies_wait_longer_than_posted_messages() {
    let fixtures = Arc::new(FixtureSet::demo());
    let systems = Arc::new(MockBusinessSystems::new(Arc::clone(&fixtures)));
    let pacing = PacingProfile {
        message_gap: Duration::from_millis(300),
        stream_gap: Duration::from_millis(500),
        ..PacingProfile::instant()
    };
    let chat = CopilotChat::new(fixtures, systems, pacing);

    let started = Instant::now();
    chat.say("Can we expedite?").await.expect("replied");
    assert_eq!(started.elapsed(), Duration::from_millis(800));
    assert_eq!(chat.messages().len(), 2);
}
