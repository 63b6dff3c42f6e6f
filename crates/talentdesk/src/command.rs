//! Command-line interface.

use clap::{Args, Parser, Subcommand, ValueEnum};
use talentdesk_api::Platform;
use talentdesk_core::{CategoryFilter, ChannelFilter, InboxFilters, InboxTab};

/// Terminal front-end for the `TalentDesk` priority inbox.
#[derive(Debug, Parser)]
#[command(name = "talentdesk", version, about)]
pub struct Cli {
    /// What to show; the priority inbox when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The requested command, defaulting to the priority inbox.
    #[must_use]
    pub fn into_command(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Inbox(InboxArgs::default()))
    }
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show an inbox tab.
    Inbox(InboxArgs),
    /// List deal threads.
    Threads {
        /// Rebuild the threads or show one of them.
        #[command(subcommand)]
        action: Option<ThreadsAction>,
    },
    /// Classify one thread now.
    Classify {
        /// Thread id.
        id: String,
    },
    /// Show the effective settings.
    Settings {
        /// Write the defaults instead.
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

/// `threads` actions.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ThreadsAction {
    /// Regroup ingested email into deal threads, then list them.
    Rebuild,
    /// Show one deal thread with its emails.
    Show {
        /// Thread id.
        id: String,
    },
}

/// `settings` actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum SettingsAction {
    /// Write the default settings file.
    Init,
}

/// Arguments of `inbox`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct InboxArgs {
    /// Tab to show.
    #[arg(value_enum, default_value_t)]
    pub tab: Tab,
    /// Only show one channel.
    #[arg(long, value_enum, default_value_t)]
    pub channel: Channel,
    /// Only show one category.
    #[arg(long, value_enum, default_value_t)]
    pub category: Category,
    /// Keep running and re-render on every background refetch.
    #[arg(long)]
    pub watch: bool,
}

impl InboxArgs {
    /// Channel and category filters.
    #[must_use]
    pub fn filters(&self) -> InboxFilters {
        InboxFilters {
            channel: self.channel.into(),
            category: self.category.into(),
        }
    }
}

/// Inbox tab names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Tab {
    /// Ranked by category, unread and recency.
    #[default]
    Priority,
    /// Sent by you and not opened yet.
    Awaiting,
    /// Server-side smart buckets.
    Smart,
    /// Everything, ranked.
    All,
}

impl From<Tab> for InboxTab {
    fn from(tab: Tab) -> Self {
        match tab {
            Tab::Priority => Self::Priority,
            Tab::Awaiting => Self::AwaitingReply,
            Tab::Smart => Self::SmartCategories,
            Tab::All => Self::All,
        }
    }
}

/// Channel filter values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Channel {
    /// Every channel.
    #[default]
    All,
    /// Email.
    Email,
    /// Instagram.
    Instagram,
    /// `WhatsApp`.
    Whatsapp,
    /// `TikTok`.
    Tiktok,
}

impl From<Channel> for ChannelFilter {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::All => Self::All,
            Channel::Email => Self::Only(Platform::Email),
            Channel::Instagram => Self::Only(Platform::Instagram),
            Channel::Whatsapp => Self::Only(Platform::Whatsapp),
            Channel::Tiktok => Self::Only(Platform::Tiktok),
        }
    }
}

/// Category filter values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Category {
    /// No filtering.
    #[default]
    All,
    /// Deals.
    Deals,
    /// Events.
    Events,
    /// Gifting.
    Gifting,
    /// PR.
    Pr,
    /// Scams.
    Scam,
    /// Spam.
    Spam,
    /// Everything else, including unclassified items.
    Other,
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        match category {
            Category::All => Self::All,
            Category::Deals => Self::Deals,
            Category::Events => Self::Events,
            Category::Gifting => Self::Gifting,
            Category::Pr => Self::Pr,
            Category::Scam => Self::Scam,
            Category::Spam => Self::Spam,
            Category::Other => Self::Other,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("talentdesk").chain(args.iter().copied()))
            .map(Cli::into_command)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_is_priority_inbox() {
        let command = parse(&[]).unwrap();
        assert_eq!(command, Command::Inbox(InboxArgs::default()));
        let Command::Inbox(args) = command else {
            unreachable!();
        };
        assert_eq!(InboxTab::from(args.tab), InboxTab::Priority);
        assert_eq!(args.filters(), InboxFilters::default());
    }

    #[test]
    fn test_inbox_with_filters() {
        let command = parse(&["inbox", "all", "--channel", "whatsapp", "--category", "deals", "--watch"]).unwrap();
        let Command::Inbox(args) = command else {
            panic!("expected inbox, got {command:?}");
        };
        assert_eq!(InboxTab::from(args.tab), InboxTab::All);
        assert!(args.watch);
        assert_eq!(
            args.filters(),
            InboxFilters {
                channel: ChannelFilter::Only(Platform::Whatsapp),
                category: CategoryFilter::Deals,
            }
        );
    }

    #[test]
    fn test_tab_names() {
        for (name, tab) in [
            ("priority", InboxTab::Priority),
            ("awaiting", InboxTab::AwaitingReply),
            ("smart", InboxTab::SmartCategories),
            ("all", InboxTab::All),
        ] {
            let Command::Inbox(args) = parse(&["inbox", name]).unwrap() else {
                panic!("expected inbox");
            };
            assert_eq!(InboxTab::from(args.tab), tab);
        }
    }

    #[test]
    fn test_threads() {
        assert_eq!(parse(&["threads"]).unwrap(), Command::Threads { action: None });
        assert_eq!(
            parse(&["threads", "rebuild"]).unwrap(),
            Command::Threads {
                action: Some(ThreadsAction::Rebuild)
            }
        );
        assert_eq!(
            parse(&["threads", "show", "t1"]).unwrap(),
            Command::Threads {
                action: Some(ThreadsAction::Show { id: "t1".into() })
            }
        );
    }

    #[test]
    fn test_settings() {
        assert_eq!(parse(&["settings"]).unwrap(), Command::Settings { action: None });
        assert_eq!(
            parse(&["settings", "init"]).unwrap(),
            Command::Settings {
                action: Some(SettingsAction::Init)
            }
        );
    }

    #[test]
    fn test_usage_errors() {
        assert_eq!(
            parse(&["classify"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(parse(&["inbox", "later"]).unwrap_err().kind(), ErrorKind::InvalidValue);
        assert_eq!(
            parse(&["inbox", "--channel", "fax"]).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
        assert_eq!(
            parse(&["frobnicate"]).unwrap_err().kind(),
            ErrorKind::InvalidSubcommand
        );
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_usage_errors_exit_with_code_2() {
        assert_eq!(parse(&["inbox", "later"]).unwrap_err().exit_code(), 2);
    }
}
