// Expédition des codes de confirmation.
// L'envoi est un effet de bord fire-and-forget: il ne bloque jamais la
// réponse du signup et un échec est journalisé puis ignoré.

use std::env;

/// Lance l'envoi en tâche de fond et rend la main immédiatement
pub fn dispatch_confirmation_code(email: String, username: String, code: String) {
    tokio::spawn(async move {
        if let Err(e) = send_confirmation_code(&email, &username, &code).await {
            tracing::error!("failed to send confirmation code to {}: {}", email, e);
        }
    });
}

async fn send_confirmation_code(email: &str, username: &str, code: &str) -> Result<(), String> {
    let api_url = match env::var("EMAIL_API_URL") {
        Ok(url) => url,
        Err(_) => {
            // Pas de relai configuré (dev): le code part dans les logs
            tracing::info!("confirmation code for {} <{}>: {}", username, email, code);
            return Ok(());
        }
    };

    let response = reqwest::Client::new()
        .post(&api_url)
        .json(&serde_json::json!({
            "to": email,
            "subject": "Your confirmation code",
            "body": format!(
                "Hello {},\n\nYour confirmation code: {}\n\nExchange it at /api/v1/auth/token",
                username, code
            ),
        }))
        .send()
        .await
        .map_err(|e| format!("email relay unreachable: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("email relay returned {}", response.status()));
    }

    Ok(())
}
