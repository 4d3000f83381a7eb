use degree_planner_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("degree planner error: {err}");
        std::process::exit(1);
    }
}
