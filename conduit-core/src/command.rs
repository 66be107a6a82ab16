use std::any::Any;

/// 命令（Command）
///
/// 表达“要做什么”的不可变请求对象，由且仅由一个处理器执行，并返回 [`Command::Output`]。
/// - 以运行时类型（`TypeId`）作为身份，注册表按精确类型查找处理器；
/// - 查询同样建模为命令，只是处理器没有副作用；
/// - 无意义返回值的命令使用 `type Output = ();`。
///
/// 关联常量：
/// - `NAME`：命令的稳定名称，用于日志与错误信息。避免依赖 `type_name::<T>()`。
pub trait Command: Send + Sync + 'static {
    /// 命令的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    /// 处理器返回的结果类型
    type Output: Send + 'static;
}

/// 类型擦除后的命令视图
///
/// 中间件与路由谓词与具体命令类型无关，只能通过该 trait 观察命令，
/// 需要时再向下转型为具体类型。所有 [`Command`] 自动实现。
pub trait AnyCommand: Any + Send + Sync {
    fn command_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

/// 在中间件链中按值传递的命令
pub type BoxCommand = Box<dyn AnyCommand>;

impl<C: Command> AnyCommand for C {
    fn command_name(&self) -> &'static str {
        C::NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

impl dyn AnyCommand {
    /// 是否为指定的命令类型
    pub fn is<C: Command>(&self) -> bool {
        self.as_any().is::<C>()
    }

    pub fn downcast_ref<C: Command>(&self) -> Option<&C> {
        self.as_any().downcast_ref::<C>()
    }

    pub fn downcast_mut<C: Command>(&mut self) -> Option<&mut C> {
        self.as_any_mut().downcast_mut::<C>()
    }
}
