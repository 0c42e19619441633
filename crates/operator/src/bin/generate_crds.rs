use kube::CustomResourceExt;
use webpinger_operator::crd::WebPinger;

fn main() -> anyhow::Result<()> {
    println!("---");
    println!("# WebPinger CRD");
    println!("{}", serde_yaml::to_string(&WebPinger::crd())?);
    Ok(())
}
