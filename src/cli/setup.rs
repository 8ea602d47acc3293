use std::io::{self, BufRead, Write};

use crate::{error, info, management::CredentialStore, success, types::Credentials};

pub async fn setup() {
    info!(
        "Setting up Spotify OAuth:\n  1. Go to https://developer.spotify.com/dashboard and log in\n  2. Create an app or select an existing one\n  3. Add the redirect URI configured for sporlsync (default http://127.0.0.1:8000/callback)\n  4. Copy the Client ID and Client Secret"
    );

    let client_id = match prompt("Client ID") {
        Ok(v) => v,
        Err(e) => error!("Cannot read Client ID. Err: {}", e),
    };
    let client_secret = match prompt("Client Secret") {
        Ok(v) => v,
        Err(e) => error!("Cannot read Client Secret. Err: {}", e),
    };

    let store = CredentialStore::default_location();
    let credentials = Credentials {
        client_id,
        client_secret,
    };

    match store.save_credentials(&credentials).await {
        Ok(()) => success!(
            "Credentials saved to {}. Run `sporlsync auth` next.",
            store.path().display()
        ),
        Err(e) => error!("Failed to save credentials. Err: {}", e),
    }
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
