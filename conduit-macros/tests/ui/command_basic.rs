use conduit::Command;

#[derive(Command)]
#[command(output = u64)]
struct CountUsers;

#[derive(Command)]
#[command(name = "user.rename", output = Result<(), String>)]
struct RenameUser {
    #[allow(dead_code)]
    to: String,
}

// 未指定 output 时为 ()
#[derive(Command)]
struct Ping;

fn assert_output<C: Command<Output = O>, O>() {}

fn main() {
    assert_eq!(<CountUsers as Command>::NAME, "CountUsers");
    assert_eq!(<RenameUser as Command>::NAME, "user.rename");
    assert_eq!(<Ping as Command>::NAME, "Ping");

    assert_output::<CountUsers, u64>();
    assert_output::<RenameUser, Result<(), String>>();
    assert_output::<Ping, ()>();
}
