use clap::{arg,crate_version,value_parser,ArgMatches,Command};
use brut::{HashScheme,Listing,Options,ResourceFile,STDRESULT,STD_OPTIONS};
use brut::format::Extension;

const RCH: &str = "unreachable was reached";

/// session settings from the switches, which are accepted before or after the subcommand
fn options(cmd: &ArgMatches) -> Options {
    let mut opt = STD_OPTIONS;
    if let Some(scheme) = cmd.get_one::<String>("hash") {
        if scheme=="id" {
            opt.hash = HashScheme::Id;
        }
    }
    opt.compress = !cmd.get_flag("no-compress");
    opt.rotate = cmd.get_flag("rotate");
    opt.restore = cmd.get_flag("restore");
    if let Some(max) = cmd.get_one::<u32>("max-size") {
        opt.max_resource_size = *max;
    }
    opt
}

fn print_listing(listing: &[Listing]) {
    for item in listing {
        match item {
            Listing::Entry { name, offset } => println!("{:13} {:>10}",name,offset),
            Listing::Resource(header) => {
                let ext = Extension::from_code(header.extension).unwrap_or(Extension::Unknown);
                println!("{:13} {:>10} {:>10} {:3} {}",header.filename,header.uncompressed_size,
                    header.compressed_size,ext.as_str(),header.compression_type());
            },
            Listing::Invalid { .. } => println!("{}",item.name())
        }
    }
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
List:          `brut GAME.RES list`
Verify:        `brut GAME.RES list --verify`
Add images:    `brut GAME.RES add 'art/*.PCX' --rotate`
Extract:       `brut GAME.RES extract BUYMORE.PCX --restore -d out`
Remove by ID:  `brut GAME.RES --hash id remove WAV1209348.WAV`";

    let mut main_cmd = Command::new("brut")
        .about("Manage Birthright resource files")
        .after_long_help(long_help)
        .version(crate_version!())
        .subcommand_required(true)
        .arg(arg!(<resfile> "path to the resource file, created if it does not exist"))
        .arg(arg!(--hash <SCHEME> "hash scheme for resource names").value_parser(["crc","id"])
            .default_value("crc").global(true))
        .arg(arg!(--"no-compress" "store new resources without compression").global(true))
        .arg(arg!(--rotate "store PCX images rotated").global(true))
        .arg(arg!(--restore "extract image resources as PCX files").global(true))
        .arg(arg!(--"max-size" <BYTES> "largest file that can be added").value_parser(value_parser!(u32))
            .global(true));
    main_cmd = main_cmd.subcommand(Command::new("list")
        .arg(arg!(-v --verify "read every resource header rather than the directory"))
        .about("list the resources"));
    main_cmd = main_cmd.subcommand(Command::new("add")
        .arg(arg!(<PATTERN> ... "files to add, `*` and `?` match within the last component"))
        .about("add files to the resource file"));
    main_cmd = main_cmd.subcommand(Command::new("remove")
        .arg(arg!(<NAME> ... "names of the resources to remove"))
        .about("remove resources, nothing is removed if any name is missing"));
    main_cmd = main_cmd.subcommand(Command::new("extract")
        .arg(arg!(<NAME> ... "names of the resources to extract"))
        .arg(arg!(-d --dir <PATH> "output directory").default_value("."))
        .about("extract resources by name"));
    main_cmd = main_cmd.subcommand(Command::new("extract-all")
        .arg(arg!(-d --dir <PATH> "output directory").default_value("."))
        .about("extract every resource"));

    let matches = main_cmd.get_matches();
    let path = matches.get_one::<String>("resfile").expect(RCH);
    let mut resfile = ResourceFile::open_path(path)?;

    if let Some(cmd) = matches.subcommand_matches("list") {
        *resfile.options_mut() = options(cmd);
        let listing = resfile.list_contents(cmd.get_flag("verify"));
        print_listing(&listing);
        eprintln!("{} resources, version {}",resfile.count(),resfile.file_version());
    }

    if let Some(cmd) = matches.subcommand_matches("add") {
        *resfile.options_mut() = options(cmd);
        for pattern in cmd.get_many::<String>("PATTERN").expect(RCH) {
            for header in resfile.add_files(pattern)? {
                eprintln!("added {} ({} bytes, {})",header.filename,header.uncompressed_size,header.compression_type());
            }
        }
    }

    if let Some(cmd) = matches.subcommand_matches("remove") {
        *resfile.options_mut() = options(cmd);
        let names: Vec<&String> = cmd.get_many::<String>("NAME").expect(RCH).collect();
        let old_count = resfile.count();
        resfile.remove_files(&names)?;
        eprintln!("removed {} resources, {} remain",old_count - resfile.count(),resfile.count());
    }

    if let Some(cmd) = matches.subcommand_matches("extract") {
        *resfile.options_mut() = options(cmd);
        let dir = std::path::Path::new(cmd.get_one::<String>("dir").expect(RCH));
        for name in cmd.get_many::<String>("NAME").expect(RCH) {
            let out = resfile.extract_file(name,dir)?;
            eprintln!("extracted {}",out.display());
        }
    }

    if let Some(cmd) = matches.subcommand_matches("extract-all") {
        *resfile.options_mut() = options(cmd);
        let dir = std::path::Path::new(cmd.get_one::<String>("dir").expect(RCH));
        let paths = resfile.extract_all(dir)?;
        eprintln!("extracted {} resources",paths.len());
    }

    Ok(())
}
