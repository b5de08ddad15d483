//! Built-in example sources, one per dialect.

use crate::ir::DiagramKind;

pub const USE_CASE: &str = "کاربر -> (ورود به سیستم)
Admin -> (ManageUsers)
Admin -> (GenerateReport)";

pub const SEQUENCE: &str = "Alice -> Bob: Hello
activate Bob
Bob --> Alice: Ack
deactivate Bob
Alice -> Bob: Follow up";

pub const CLASS: &str = "class User {
+name: string
+login(password: string): boolean
}

class Admin {
+permissions: string[]
+ban(userId: number): void
}

User <|-- Admin
User *-- Profile";

pub const STATE: &str = "[*] -> [Idle]
[Idle] -> [Active]: start
[Active] -> [Paused]: hold
[Paused] -> [Active]: resume
[Active] -> [*]: done";

pub fn sample(kind: DiagramKind) -> &'static str {
    match kind {
        DiagramKind::UseCase => USE_CASE,
        DiagramKind::Sequence => SEQUENCE,
        DiagramKind::Class => CLASS,
        DiagramKind::State => STATE,
    }
}
