use conduit::Command;

#[derive(Command)]
#[command(output = Vec<T>)]
struct Page<T: Send + Sync + 'static> {
    #[allow(dead_code)]
    offset: usize,
    #[allow(dead_code)]
    marker: std::marker::PhantomData<T>,
}

fn main() {
    assert_eq!(<Page<String> as Command>::NAME, "Page");
    let _out: <Page<String> as Command>::Output = vec![String::new()];
}
