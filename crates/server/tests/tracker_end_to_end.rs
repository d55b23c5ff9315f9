use std::{sync::Arc, time::Duration};

use db::{
    DBService,
    models::content_meta::{ContentMeta, ContentType},
};
use deployment::Deployment;
use local_deployment::LocalDeployment;
use server::app;
use services::services::{
    config::Config,
    counter_api::{CounterApi, CounterApiClient},
    visitor_tracker::{Interaction, TrackerConfig, VisitorTracker},
};
use tokio::{net::TcpListener, time::timeout};

const VISITORS: &str = "site_total_visitors";

#[tokio::test]
async fn tracker_reports_click_and_throttles_the_next_one() {
    let db = DBService::new_in_memory().await.unwrap();
    for _ in 0..5 {
        ContentMeta::increment(&db.pool, VISITORS, ContentType::Site)
            .await
            .unwrap();
    }
    let deployment = LocalDeployment::from_parts(Config::default(), db);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let router = app(deployment.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = CounterApiClient::new(&format!("http://{address}/")).unwrap();
    assert_eq!(client.fetch_count().await.unwrap(), 5);

    let tracker = VisitorTracker::attach(Arc::new(client), TrackerConfig::default());
    let mut updates = tracker.subscribe();

    tracker.interact(Interaction::Click);
    timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("count was never refreshed")
        .unwrap();
    assert_eq!(tracker.count(), Some(6));

    // well inside the throttle window
    tracker.interact(Interaction::KeyPress);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        ContentMeta::views(&deployment.db().pool, VISITORS).await.unwrap(),
        6
    );
    assert_eq!(tracker.count(), Some(6));

    tracker.dispose();
}
