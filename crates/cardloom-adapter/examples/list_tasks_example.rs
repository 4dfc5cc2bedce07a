/*
[INPUT]:  CARDLOOM_TOKEN / CARDLOOM_USER_ID environment variables
[OUTPUT]: Most recent tasks and the outline of the first catalog_ready one
[POS]:    Examples - authenticated task queries
[UPDATE]: When adding new task endpoints
*/

use cardloom_adapter::*;

/// Example: list recent tasks and print the outline of a ready catalog
#[tokio::main]
async fn main() {
    println!("=== Cardloom Task Listing Example ===\n");

    let (Ok(access_token), Ok(user_id)) = (
        std::env::var("CARDLOOM_TOKEN"),
        std::env::var("CARDLOOM_USER_ID"),
    ) else {
        eprintln!("Set CARDLOOM_TOKEN and CARDLOOM_USER_ID first");
        return;
    };

    let mut client = match CardloomClient::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    client.set_credentials(Credentials {
        access_token,
        user_id,
    });

    let page = match client.list_tasks(&ListTasksQuery::default()).await {
        Ok(page) => page,
        Err(e) => {
            eprintln!("✗ Error listing tasks: {}", e);
            return;
        }
    };
    println!("✓ {} task(s) in total\n", page.total_count);
    for task in &page.tasks {
        println!("  {}  {:<8} {}", task.id, task.task_type(), task.status);
    }

    let Some(ready) = page
        .tasks
        .iter()
        .find(|task| task.status == TaskStatus::CatalogReady)
    else {
        println!("\nNo catalog_ready task to inspect");
        return;
    };

    println!("\nOutline of {}:", ready.id);
    match client.fetch_catalog(&ready.id).await {
        Ok(chapters) => {
            for chapter in &chapters {
                println!("  {}", chapter.chapter);
                for section in &chapter.sections {
                    println!("    {} ({} subsections)", section.section, section.subsections.len());
                }
            }
        }
        Err(e) => println!("✗ Error: {}", e),
    }
}
