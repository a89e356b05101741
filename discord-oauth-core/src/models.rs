use serde::Deserialize;

/// Token response of `POST /oauth2/token`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// The subset of `GET /users/@me` the gateway keeps.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl DiscordUser {
    /// Username with the legacy `#discriminator` appended when the account still has one.
    ///
    /// ```
    /// use discord_oauth_core::DiscordUser;
    ///
    /// let user: DiscordUser = serde_json::from_str(
    ///     r#"{"id": "80351110224678912", "username": "nelly", "discriminator": "1337"}"#,
    /// ).unwrap();
    /// assert_eq!(user.display_username(), "nelly#1337");
    /// ```
    pub fn display_username(&self) -> String {
        match self.discriminator.as_deref() {
            Some(discriminator) if !discriminator.is_empty() && discriminator != "0" => {
                format!("{}#{}", self.username, discriminator)
            }
            _ => self.username.clone(),
        }
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("https://cdn.discordapp.com/avatars/{}/{}.png", self.id, hash))
    }
}

/// Partial guild object of `GET /users/@me/guilds`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DiscordGuild {
    pub id: String,
    pub name: String,
}
