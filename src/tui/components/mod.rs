//! # TUI Components
//!
//! Everything related to one component lives in one file: its persistent
//! state, its event/output types, rendering, and tests. Components receive
//! external data as props from the render loop rather than reading global
//! state, so each one can be driven and asserted in isolation.
//!
//! ```text
//! components/
//! ├── title_bar.rs      (header: session, model, user)
//! ├── message.rs        (single message renderer)
//! ├── message_list.rs   (scrollable transcript)
//! ├── input_box.rs      (multi-line composer)
//! ├── login.rs          (sign-in form)
//! ├── session_panel.rs  (session browser overlay, Ctrl+O)
//! ├── model_picker.rs   (provider/model overlay, Ctrl+P)
//! └── attach_prompt.rs  (file path prompt, Ctrl+U)
//! ```

pub mod attach_prompt;
pub mod input_box;
pub mod login;
pub mod message;
pub mod message_list;
pub mod model_picker;
pub mod session_panel;
pub mod title_bar;

pub use attach_prompt::{AttachEvent, AttachPrompt};
pub use input_box::{InputBox, InputEvent};
pub use login::{LoginEvent, LoginForm};
pub use message::MessageView;
pub use message_list::{MessageList, MessageListView};
pub use model_picker::{ModelPicker, ModelPickerState, PickerEvent};
pub use session_panel::{PanelEvent, SessionPanel, SessionPanelState};
pub use title_bar::TitleBar;
