//! Audio output list with enable/disable toggling.

use ratatui::{layout::Rect, text::Span, Frame};

use tonearm_proto::protocol::{Command, Output};

use crate::action::{Action, PanelId};
use crate::keymap::KeyAction;
use crate::panel::{Input, Panel, TickContext, View};
use crate::panels::{draw_rows, move_cursor};
use crate::remote::{Reply, Request};
use crate::widgets::scrollable_list::CursorList;

pub struct OutputPanel {
    list: CursorList,
    outputs: Vec<Output>,
}

impl OutputPanel {
    pub fn new(height: usize) -> Self {
        Self {
            list: CursorList::new(height),
            outputs: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }
}

impl Panel for OutputPanel {
    fn id(&self) -> PanelId {
        PanelId::Output
    }

    fn sync(&mut self, _ctx: &mut TickContext) -> Vec<Action> {
        vec![Action::Query(Request::Outputs)]
    }

    fn on_reply(&mut self, reply: Reply, _ctx: &mut TickContext) -> Vec<Action> {
        if let Reply::Outputs(outputs) = reply {
            self.outputs = outputs;
            self.list.rebuild(self.outputs.len());
        }
        vec![]
    }

    fn local_update(&mut self, input: Option<&Input>, ctx: &mut TickContext) -> Vec<Action> {
        if move_cursor(&mut self.list, input, ctx) || !ctx.pressed(input, KeyAction::Toggle) {
            return vec![];
        }
        let Some(output) = self.outputs.get_mut(self.list.selected()) else {
            return vec![];
        };
        let cmd = if output.enabled {
            Command::DisableOutput(output.id)
        } else {
            Command::EnableOutput(output.id)
        };
        // shown flipped until the next listing confirms it
        output.enabled = !output.enabled;
        vec![Action::run(cmd)]
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &View) {
        let outputs = &self.outputs;
        draw_rows(frame, area, &self.list, |i, _width| {
            let o = &outputs[i];
            let mark = if o.enabled { 'o' } else { 'x' };
            vec![Span::raw(format!("[{mark}] {}", o.name))]
        });
    }

    fn resize(&mut self, height: usize) {
        self.list.resize(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::testing::Harness;

    fn outputs() -> Reply {
        Reply::Outputs(vec![
            Output {
                id: 0,
                name: "ALSA".into(),
                enabled: true,
            },
            Output {
                id: 1,
                name: "HTTP stream".into(),
                enabled: false,
            },
        ])
    }

    #[test]
    fn test_toggle_flips_selected_output() {
        let mut h = Harness::new();
        let mut panel = OutputPanel::new(10);
        assert_eq!(panel.sync(&mut h.ctx()), vec![Action::Query(Request::Outputs)]);
        panel.on_reply(outputs(), &mut h.ctx());

        let toggle = h.key(KeyAction::Toggle);
        assert_eq!(
            panel.local_update(Some(&toggle), &mut h.ctx()),
            vec![Action::run(Command::DisableOutput(0))]
        );
        assert!(!panel.outputs()[0].enabled);

        let down = h.key(KeyAction::LineDn);
        panel.local_update(Some(&down), &mut h.ctx());
        assert_eq!(
            panel.local_update(Some(&toggle), &mut h.ctx()),
            vec![Action::run(Command::EnableOutput(1))]
        );
    }

    #[test]
    fn test_toggle_on_empty_list_is_ignored() {
        let mut h = Harness::new();
        let mut panel = OutputPanel::new(10);
        let toggle = h.key(KeyAction::Toggle);
        assert!(panel.local_update(Some(&toggle), &mut h.ctx()).is_empty());
    }
}
