use polar_flow_client::utils::{calendar_events_path, parse_calendar_date};
use polar_flow_client::{Config, Credentials, Exporter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [username, password, from, to] = args.as_slice() else {
        eprintln!(
            "usage: cargo run -p polar_flow_client --example list_calendar -- <username> <password> <from> <to>"
        );
        return Ok(());
    };

    let path = calendar_events_path(parse_calendar_date(from)?, parse_calendar_date(to)?);
    let mut exporter = Exporter::new(&Config::default(), Credentials::new(username, password))?;
    exporter.login().await?;

    let refs = exporter.query_activities(&path).await?;
    if refs.is_empty() {
        println!("No activities between {from} and {to} (check the range or credentials)");
        return Ok(());
    }
    for r in refs {
        let marker = if Exporter::should_skip(&r) { " (not exportable)" } else { "" };
        println!("- {} {} {}{}", r.datetime, r.list_item_id, r.url, marker);
    }
    Ok(())
}
