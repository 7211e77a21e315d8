//! Univent demo.
//!
//! Runs the main user journeys against the in-memory backends: startup
//! routing, sign-up, event creation, joining, a full event, a ticket
//! purchase and cancellation.

use std::collections::BTreeSet;

use anyhow::Context;
use chrono::{Days, NaiveTime, Utc};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use univent_app::{AppState, Config, Route, finish_onboarding, initial_route};
use univent_core::types::{DraftPricing, EventCategory, EventDraft, Session};
use univent_events::EventQuery;

fn draft(title: &str, capacity: u32, pricing: DraftPricing) -> EventDraft {
    EventDraft {
        title: title.to_string(),
        description: format!("{title} hosted by the student union"),
        date: Utc::now().date_naive().checked_add_days(Days::new(14)),
        time: NaiveTime::from_hms_opt(18, 30, 0),
        location: "Student Union, Room 204".to_string(),
        capacity,
        cover_image: String::new(),
        category: EventCategory::Social,
        pricing,
        tags: BTreeSet::from(["demo".to_string()]),
        requirements: Vec::new(),
    }
}

async fn current_session(app: &AppState) -> anyhow::Result<Session> {
    app.auth
        .current_session()
        .await
        .context("expected a signed-in user")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        data_dir = %config.data_dir.display(),
        currency = %config.payments.default_currency,
        confirmation_delay_ms = config.payments.confirmation_delay_ms,
        "Starting Univent demo"
    );

    let app = AppState::from_config(&config);

    // Startup routing
    match initial_route(app.auth.as_ref()).await {
        Route::Onboarding => {
            info!("First launch, showing onboarding");
            finish_onboarding(app.auth.as_ref()).await;
        },
        Route::Login => info!("Returning user, showing login"),
        Route::Home => {
            info!("Session restored, signing out to replay the journey");
            app.auth.logout().await;
        },
    }

    // Organizer publishes two events
    app.auth
        .signup("Sam", "Rivera", "sam@university.edu", "organizer1")
        .await?;
    let organizer = current_session(&app).await?;

    let board_games = app
        .events
        .create_event(
            Some(&organizer),
            draft("Board Game Night", 1, DraftPricing::Free),
        )
        .await?;
    let gala = app
        .events
        .create_event(
            Some(&organizer),
            draft(
                "Spring Gala",
                100,
                DraftPricing::Paid {
                    price: 25,
                    currency: app.default_currency.clone(),
                },
            ),
        )
        .await?;
    info!(count = app.events.get_events().await.len(), "Events published");
    app.auth.logout().await;

    // A student takes the only board game spot
    app.auth
        .signup("Alex", "Johnson", "alex@university.edu", "student1")
        .await?;
    let alex = current_session(&app).await?;

    let attendee = app
        .participation
        .join_event(board_games.id, Some(&alex))
        .await?;
    info!(attendee_id = %attendee.id, event = %board_games.title, "Alex joined");

    // A second student finds the event full
    app.auth.logout().await;
    app.auth
        .signup("Jamie", "Chen", "jamie@university.edu", "student2")
        .await?;
    let jamie = current_session(&app).await?;

    if let Err(error) = app.participation.join_event(board_games.id, Some(&jamie)).await {
        warn!(%error, kind = ?error.kind(), "Jamie could not join");
    }

    // Jamie buys a gala ticket instead
    let purchase = app.participation.purchase_ticket(gala.id, Some(&jamie)).await?;
    info!(
        ticket_id = %purchase.ticket.id,
        amount = %purchase.ticket.price,
        currency = %purchase.ticket.currency,
        qr_code = %purchase.ticket.qr_code,
        "Ticket purchased"
    );

    let found = app
        .events
        .search(&EventQuery {
            text: Some("gala".to_string()),
            category: Some(EventCategory::Social),
        })
        .await;
    info!(results = found.len(), "Searched for \"gala\"");

    let tickets = app.events.user_tickets(jamie.user.id).await?;
    info!(tickets = tickets.len(), "Jamie's tickets");

    // Only the organizer may cancel
    if let Err(error) = app.events.cancel_event(Some(&jamie), board_games.id).await {
        warn!(%error, "Jamie cannot cancel someone else's event");
    }
    app.auth.logout().await;
    app.auth.login("sam@university.edu", "organizer1").await?;
    let organizer = current_session(&app).await?;
    let cancelled = app.events.cancel_event(Some(&organizer), board_games.id).await?;
    info!(event = %cancelled.title, status = %cancelled.status, "Event cancelled");

    info!(
        charges = app.payments.intents().len(),
        refunds = app.payments.refunds().len(),
        "Payment activity"
    );
    info!("Demo finished");
    Ok(())
}
