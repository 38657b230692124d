//! User-facing wording for status lines, result panels and speech.

use crate::error::FacedeskError;

/// Interface language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            "fr" | "fr-fr" => Ok(Self::Fr),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// Phrase book for one locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct Phrases {
    locale: Locale,
}

impl Phrases {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// BCP 47 tag handed to the speech engine.
    pub fn speech_lang(&self) -> &'static str {
        match self.locale {
            Locale::En => "en-US",
            Locale::Fr => "fr-FR",
        }
    }

    pub fn camera_active(&self) -> String {
        match self.locale {
            Locale::En => "Camera active".into(),
            Locale::Fr => "Caméra activée".into(),
        }
    }

    pub fn camera_error(&self, reason: &str) -> String {
        match self.locale {
            Locale::En => format!("Camera error: {reason}"),
            Locale::Fr => format!("Erreur caméra: {reason}"),
        }
    }

    pub fn file_loaded(&self) -> String {
        match self.locale {
            Locale::En => "Image loaded from file".into(),
            Locale::Fr => "Image chargée depuis le fichier".into(),
        }
    }

    pub fn name_required(&self) -> String {
        match self.locale {
            Locale::En => "Please enter a name".into(),
            Locale::Fr => "Veuillez entrer un nom".into(),
        }
    }

    pub fn registering(&self) -> String {
        match self.locale {
            Locale::En => "Registering...".into(),
            Locale::Fr => "Enregistrement en cours...".into(),
        }
    }

    pub fn analyzing(&self) -> String {
        match self.locale {
            Locale::En => "Analyzing...".into(),
            Locale::Fr => "Analyse en cours...".into(),
        }
    }

    pub fn registered(&self, name: &str) -> String {
        match self.locale {
            Locale::En => format!("Registration successful: {name}"),
            Locale::Fr => format!("Inscription réussie : {name}"),
        }
    }

    pub fn registered_title(&self) -> String {
        match self.locale {
            Locale::En => "Registered!".into(),
            Locale::Fr => "Enregistré!".into(),
        }
    }

    pub fn welcome(&self, name: &str) -> String {
        match self.locale {
            Locale::En => format!("Welcome {name}"),
            Locale::Fr => format!("Bienvenue {name}"),
        }
    }

    pub fn welcome_registered_speech(&self, name: &str) -> String {
        match self.locale {
            Locale::En => format!("Welcome to the system, {name}"),
            Locale::Fr => format!("Bienvenue dans le système, {name}"),
        }
    }

    pub fn identified(&self) -> String {
        match self.locale {
            Locale::En => "Identified!".into(),
            Locale::Fr => "Identifié!".into(),
        }
    }

    pub fn confidence(&self, percent: f64) -> String {
        match self.locale {
            Locale::En => format!("Confidence: {percent}%"),
            Locale::Fr => format!("Confiance: {percent}%"),
        }
    }

    pub fn recognized_speech(&self, name: &str) -> String {
        match self.locale {
            Locale::En => format!("Hello {name}. Access granted."),
            Locale::Fr => format!("Bonjour {name}. Accès autorisé."),
        }
    }

    pub fn unknown(&self) -> String {
        match self.locale {
            Locale::En => "Unknown".into(),
            Locale::Fr => "Inconnu".into(),
        }
    }

    pub fn not_recognized_title(&self) -> String {
        match self.locale {
            Locale::En => "Person not recognized".into(),
            Locale::Fr => "Personne non reconnue".into(),
        }
    }

    pub fn please_register(&self) -> String {
        match self.locale {
            Locale::En => "Please register using the form".into(),
            Locale::Fr => "Veuillez vous inscrire ci-contre".into(),
        }
    }

    pub fn unknown_speech(&self) -> String {
        match self.locale {
            Locale::En => "Person not recognized. Please enter your name and register.".into(),
            Locale::Fr => {
                "Personne non reconnue. Veuillez entrer votre nom et cliquer sur Inscription."
                    .into()
            }
        }
    }

    pub fn error_title(&self) -> String {
        match self.locale {
            Locale::En => "Error".into(),
            Locale::Fr => "Erreur".into(),
        }
    }

    pub fn error_speech(&self) -> String {
        match self.locale {
            Locale::En => "An error occurred.".into(),
            Locale::Fr => "Une erreur est survenue.".into(),
        }
    }

    /// The message shown to the user for a failed action.
    ///
    /// Service-provided details are returned verbatim.
    pub fn describe_error(&self, err: &FacedeskError) -> String {
        match (err, self.locale) {
            (FacedeskError::Service { detail: Some(detail), .. }, _) => detail.clone(),
            (FacedeskError::Service { detail: None, .. }, Locale::En) => {
                "Unknown service error".into()
            }
            (FacedeskError::Service { detail: None, .. }, Locale::Fr) => "Erreur inconnue".into(),
            (FacedeskError::Transport(_), Locale::En) => "Unable to reach the server".into(),
            (FacedeskError::Transport(_), Locale::Fr) => {
                "Erreur de connexion au serveur".into()
            }
            (FacedeskError::Validation(reason), _) => reason.clone(),
            (FacedeskError::CameraUnavailable(reason), _) => self.camera_error(reason),
            (FacedeskError::NoActiveStream, Locale::En) => {
                "No camera stream and no file selected".into()
            }
            (FacedeskError::NoActiveStream, Locale::Fr) => {
                "Aucune caméra active et aucun fichier sélectionné".into()
            }
            (FacedeskError::RequestInFlight, Locale::En) => {
                "A request is already in progress".into()
            }
            (FacedeskError::RequestInFlight, Locale::Fr) => {
                "Une requête est déjà en cours".into()
            }
            (other, _) => other.to_string(),
        }
    }
}
