//! Example: Show how much of a service account's quota is used
//!
//! Run with: DRIVE_CREDENTIALS=$(base64 < key.json) cargo run -p drive --example usage -- <FOLDER_ID>

use drive::Client;

const QUOTA: u64 = 15 * 1024 * 1024 * 1024;

fn main() -> drive::Result<()> {
    let encoded = std::env::var("DRIVE_CREDENTIALS").unwrap_or_default();
    let client = Client::from_credentials(&encoded)?;

    let owned = client.owned_files()?;
    let used: u64 = owned.iter().map(|f| f.size).sum();
    println!("{} owned files, {} of {} bytes used", owned.len(), used, QUOTA);

    if let Some(folder) = std::env::args().nth(1) {
        println!("\nFiles in {folder}:");
        println!("{:-<60}", "");
        for file in client.children(&folder)? {
            println!("{:>12} {} ({})", file.size, file.name, file.id);
        }
    }

    Ok(())
}
