use crate::platform::Platform;
use tracing::debug;

pub const DEFAULT_CLOAK_TITLE: &str = "homework bro bro";
pub const DEFAULT_CLOAK_ICON: &str = "favicon.png";
pub const CLOAK_TITLE_PLACEHOLDER: &str = "Google Docs";
pub const CLOAK_ICON_PLACEHOLDER: &str =
    "https://ssl.gstatic.com/docs/documents/images/kix-favicon7.ico";
pub const CONTACT_DISCORD: &str = "https://discord.gg/NAFw4ykZ7n";

/// Entries of the settings popup, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    ToggleDarkMode,
    TabCloak,
    Contact,
}

impl SettingsAction {
    pub const ALL: [SettingsAction; 3] = [Self::ToggleDarkMode, Self::TabCloak, Self::Contact];

    pub fn label(self) -> &'static str {
        match self {
            Self::ToggleDarkMode => "Toggle Dark Mode",
            Self::TabCloak => "Tab Cloak",
            Self::Contact => "Contact",
        }
    }
}

/// Which input of the tab-cloak popup has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloakField {
    Title,
    Icon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupBody {
    Settings { selected: usize },
    TabCloak {
        title_input: String,
        icon_input: String,
        focus: CloakField,
    },
    Contact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub title: &'static str,
    pub body: PopupBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Popup slot, theme and title/icon cloak. Shares nothing with the catalog.
#[derive(Debug, Default)]
pub struct CosmeticController {
    popup: Option<Popup>,
    theme: Theme,
    title: Option<String>,
    icon: Option<String>,
}

impl CosmeticController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn is_popup_open(&self) -> bool {
        self.popup.is_some()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    fn show(&mut self, title: &'static str, body: PopupBody) {
        debug!("Popup: {}", title);
        self.popup = Some(Popup { title, body });
    }

    pub fn open_settings(&mut self) {
        self.show("Settings", PopupBody::Settings { selected: 0 });
    }

    pub fn open_tab_cloak(&mut self) {
        self.close_popup();
        self.show(
            "Tab Cloak",
            PopupBody::TabCloak {
                title_input: String::new(),
                icon_input: String::new(),
                focus: CloakField::Title,
            },
        );
    }

    pub fn open_contact(&mut self) {
        self.close_popup();
        self.show("Contact", PopupBody::Contact);
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    /// A click on the popup overlay closes it unless it landed on the content.
    pub fn click(&mut self, inside_content: bool) {
        if !inside_content {
            self.close_popup();
        }
    }

    pub fn toggle_dark_mode(&mut self) {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
    }

    /// Apply a title cloak; blank input falls back to the default title.
    pub fn cloak_name(&mut self, input: &str, platform: &mut impl Platform) {
        let title = match input.trim() {
            "" => DEFAULT_CLOAK_TITLE,
            t => t,
        };
        platform.set_title(title);
        self.title = Some(title.to_string());
    }

    /// Apply an icon cloak; blank input falls back to the default icon.
    pub fn cloak_icon(&mut self, input: &str, platform: &mut impl Platform) {
        let icon = match input.trim() {
            "" => DEFAULT_CLOAK_ICON,
            i => i,
        };
        platform.set_icon(icon);
        self.icon = Some(icon.to_string());
    }

    pub fn select_next(&mut self) {
        if let Some(Popup {
            body: PopupBody::Settings { selected },
            ..
        }) = &mut self.popup
        {
            *selected = (*selected + 1) % SettingsAction::ALL.len();
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(Popup {
            body: PopupBody::Settings { selected },
            ..
        }) = &mut self.popup
        {
            *selected = (*selected + SettingsAction::ALL.len() - 1) % SettingsAction::ALL.len();
        }
    }

    /// Run the highlighted settings entry.
    pub fn activate_selected(&mut self) {
        let action = match &self.popup {
            Some(Popup {
                body: PopupBody::Settings { selected },
                ..
            }) => SettingsAction::ALL[*selected % SettingsAction::ALL.len()],
            _ => return,
        };
        self.run_setting(action);
    }

    pub fn run_setting(&mut self, action: SettingsAction) {
        match action {
            SettingsAction::ToggleDarkMode => self.toggle_dark_mode(),
            SettingsAction::TabCloak => self.open_tab_cloak(),
            SettingsAction::Contact => self.open_contact(),
        }
    }

    pub fn switch_cloak_field(&mut self) {
        if let Some(Popup {
            body: PopupBody::TabCloak { focus, .. },
            ..
        }) = &mut self.popup
        {
            *focus = match focus {
                CloakField::Title => CloakField::Icon,
                CloakField::Icon => CloakField::Title,
            };
        }
    }

    /// Edit the focused cloak input and apply it immediately.
    pub fn edit_cloak_input(&mut self, edit: impl FnOnce(&mut String), platform: &mut impl Platform) {
        let (value, field) = match &mut self.popup {
            Some(Popup {
                body:
                    PopupBody::TabCloak {
                        title_input,
                        icon_input,
                        focus,
                    },
                ..
            }) => {
                let input = match focus {
                    CloakField::Title => title_input,
                    CloakField::Icon => icon_input,
                };
                edit(input);
                (input.clone(), *focus)
            }
            _ => return,
        };
        match field {
            CloakField::Title => self.cloak_name(&value, platform),
            CloakField::Icon => self.cloak_icon(&value, platform),
        }
    }
}
