use std::str::FromStr;

use thiserror::Error;

use crate::{
    network::{device::DeviceId, link::LinkId, node::Position},
    topology::{
        command::DeviceAction,
        interaction::{InteractionEvent, TapTarget},
        layout::LayoutKind,
        view::ViewEvent,
    },
};

pub const HELP: &str = "\
commands:
  connect                   toggle connect mode
  tap node <id>             tap a router
  tap edge <id>             tap a link
  tap bg                    tap the background
  close                     close the detail panel
  drag <id> <x> <y>         move a router
  layout circle|grid        re-layout every router
  fit                       frame all routers
  start|stop|restart|delete <id>
  show                      print the current view
  help                      this text
  quit";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a number")]
    NotANumber(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    View(ViewEvent),
    Show,
    Help,
    Quit,
}

fn coordinate(raw: &str) -> Result<f32, ConsoleError> {
    raw.parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ConsoleError::NotANumber(raw.to_string()))
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            ["connect"] => ConsoleCommand::View(ViewEvent::toggle_connect()),
            ["tap", "node", id] => ConsoleCommand::View(ViewEvent::tap(TapTarget::Node(DeviceId::new(*id)))),
            ["tap", "edge", id] => ConsoleCommand::View(ViewEvent::tap(TapTarget::Edge(LinkId::new(*id)))),
            ["tap", "bg"] => ConsoleCommand::View(ViewEvent::tap(TapTarget::Background)),
            ["tap", ..] => return Err(ConsoleError::Usage("tap node <id> | tap edge <id> | tap bg")),
            ["close"] => ConsoleCommand::View(ViewEvent::Interaction(InteractionEvent::CloseDetails)),
            ["drag", id, x, y] => ConsoleCommand::View(ViewEvent::Drag {
                node: DeviceId::new(*id),
                position: Position::new(coordinate(x)?, coordinate(y)?),
            }),
            ["drag", ..] => return Err(ConsoleError::Usage("drag <id> <x> <y>")),
            ["layout", kind] => {
                let kind = LayoutKind::from_str(kind).map_err(|_| ConsoleError::Usage("layout circle|grid"))?;
                ConsoleCommand::View(ViewEvent::Layout(kind))
            }
            ["layout", ..] => return Err(ConsoleError::Usage("layout circle|grid")),
            ["fit"] => ConsoleCommand::View(ViewEvent::FitView),
            ["show"] => ConsoleCommand::Show,
            ["help"] => ConsoleCommand::Help,
            ["quit"] | ["exit"] => ConsoleCommand::Quit,
            [verb, rest @ ..] => match DeviceAction::from_str(verb) {
                Ok(action) => match rest {
                    [id] => ConsoleCommand::View(ViewEvent::DeviceCommand {
                        device: DeviceId::new(*id),
                        action,
                    }),
                    _ => return Err(ConsoleError::Usage("start|stop|restart|delete <id>")),
                },
                Err(_) => return Err(ConsoleError::Unknown(verb.to_string())),
            },
            [] => return Err(ConsoleError::Usage("help")),
        };
        Ok(command)
    }
}
