use proc_macro::TokenStream;

mod command;
mod notification;

/// 命令派生宏
/// - 为目标类型实现 `::conduit::Command`
/// - 支持参数：`#[command(output = Type, name = "Name")]`
///   - `output`：处理器返回类型，默认 `()`
///   - `name`：稳定名称，默认类型标识符
#[proc_macro_derive(Command, attributes(command))]
pub fn derive_command(input: TokenStream) -> TokenStream {
    command::expand(input)
}

/// 通知派生宏
/// - 为目标类型实现 `::conduit::Notification`
/// - 支持参数：`#[notification(name = "Name")]`，默认类型标识符
#[proc_macro_derive(Notification, attributes(notification))]
pub fn derive_notification(input: TokenStream) -> TokenStream {
    notification::expand(input)
}
