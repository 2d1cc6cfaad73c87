use anyhow::{Context, Result, anyhow};
use clap::Parser;
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Group, Path, Rectangle, Text as TextEl};

use graticule::types::{
    hours_to_degrees, parse_dms, parse_hms, sexagesimal_dms_to_degrees, sexagesimal_hms_to_hours,
};
use graticule::{
    CoordSys, GridOptions, GridOverlay, LabelFormat, Projection, SphereProjection, ViewDescriptor,
    WorldPoint, compute_grid,
};

#[derive(Parser, Debug)]
#[command(name = "graticule")]
#[command(about = "Celestial coordinate grid overlays for sky views", version)]
struct Args {
    /// Center longitude/RA either as hour:minute:second (e.g. "5:35:17.3") or decimal degrees ("83.821")
    #[arg(long = "ra", alias = "center-lon")]
    ra: String,

    /// Center latitude/Dec as degree:minute:second (e.g. "-5:23:28") or decimal degrees ("-5.391")
    #[arg(long = "dec", alias = "center-lat")]
    dec: String,

    /// Field of view (in degrees)
    #[arg(long, default_value_t = 40.0)]
    fov: f64,

    /// Projection to view through, either gnomonic, stereographic, orthographic, or equidistant
    #[arg(long, default_value = "stereographic")]
    projection: String,

    /// Coordinate system of the grid: j2000, b1950, galactic, or ecliptic
    #[arg(long, default_value = "j2000")]
    system: String,

    /// Treat the view as an unbounded all-sky mosaic
    #[arg(long, default_value_t = false)]
    full_sky: bool,

    /// Output image width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Output image height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Zoom factor; 4 and above densifies the grid
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    /// Label style for equatorial systems: hms or decimal
    #[arg(long, default_value = "hms")]
    label_format: String,

    /// Suppress grid labels
    #[arg(long, default_value_t = false)]
    no_labels: bool,

    /// Output SVG path
    #[arg(short = 'o', long = "out")]
    out: String,

    /// Log specification (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log: String,
}

fn parse_lon_deg(s: &str) -> Result<f64> {
    if s.contains(':') {
        let (h, m, sec) = parse_hms(s).ok_or_else(|| anyhow!("bad RA HMS: {s}"))?;
        let hours = sexagesimal_hms_to_hours(h, m, sec);
        Ok(hours_to_degrees(hours).rem_euclid(360.0))
    } else {
        let deg: f64 = s.parse().context("RA must be HMS or degrees")?;
        Ok(deg.rem_euclid(360.0))
    }
}

fn parse_lat_deg(s: &str) -> Result<f64> {
    if s.contains(':') {
        let (d, m, sec) = parse_dms(s).ok_or_else(|| anyhow!("bad Dec DMS: {s}"))?;
        Ok(sexagesimal_dms_to_degrees(d, m, sec))
    } else {
        let deg: f64 = s.parse().context("Dec must be DMS or degrees")?;
        Ok(deg)
    }
}

fn parse_projection(s: &str) -> Result<Projection> {
    Projection::from_str(&s.to_lowercase()).ok_or_else(|| {
        anyhow!("invalid projection '{s}'. Use: gnomonic | stereographic | orthographic | equidistant")
    })
}

fn parse_system(s: &str) -> Result<CoordSys> {
    CoordSys::from_str(&s.to_lowercase())
        .ok_or_else(|| anyhow!("invalid system '{s}'. Use: j2000 | b1950 | galactic | ecliptic"))
}

fn parse_label_format(s: &str) -> Result<LabelFormat> {
    match s.to_lowercase().as_str() {
        "hms" => Ok(LabelFormat::Hms),
        "decimal" => Ok(LabelFormat::Decimal),
        _ => Err(anyhow!("invalid label format '{s}'. Use: hms | decimal")),
    }
}

fn setup_logging(spec: &str) -> Result<()> {
    flexi_logger::Logger::try_with_str(spec)
        .context("bad log specification")?
        .start()
        .context("logger failed to start")?;
    Ok(())
}

fn render_svg(overlay: &GridOverlay, width: u32, height: u32) -> Document {
    let background = Rectangle::new()
        .set("x", 0)
        .set("y", 0)
        .set("width", width)
        .set("height", height)
        .set("fill", "#101418");

    let mut d = Data::new();
    for s in &overlay.segments {
        d = d.move_to((s.a.x, s.a.y)).line_to((s.b.x, s.b.y));
    }
    let lines = Path::new()
        .set("class", "graticule")
        .set("fill", "none")
        .set("stroke", "#5b7a99")
        .set("stroke-width", 0.75)
        .set("d", d);

    let mut labels = Group::new().set("class", "grid-labels");
    for label in &overlay.labels {
        let text = TextEl::new(label.text.clone())
            .set("x", label.anchor.x)
            .set("y", label.anchor.y - 3.0)
            .set("fill", "#9db8d2")
            .set("font-size", 11)
            .set(
                "transform",
                format!(
                    "rotate({:.2} {:.2} {:.2})",
                    label.angle_deg, label.anchor.x, label.anchor.y
                ),
            );
        labels = labels.add(text);
    }

    Document::new()
        .set("xmlns", "http://www.w3.org/2000/svg")
        .set("width", width)
        .set("height", height)
        .add(background)
        .add(lines)
        .add(labels)
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log)?;

    let lon = parse_lon_deg(&args.ra)?;
    let lat = parse_lat_deg(&args.dec)?;
    let csys = parse_system(&args.system)?;
    let projection = parse_projection(&args.projection)?;
    let label_format = parse_label_format(&args.label_format)?;

    let center = WorldPoint::new(lon, lat, csys);
    let view = ViewDescriptor {
        width: args.width as f64,
        height: args.height as f64,
        screen_width: args.width as f64,
        zoom_factor: args.zoom,
        csys,
        label_format,
        is_full_sky: args.full_sky,
        fov_deg: args.fov,
        center,
    };
    let converter = SphereProjection::new(
        center,
        projection,
        0.0,
        args.fov,
        view.width,
        view.height,
    );
    let opts = GridOptions {
        use_labels: !args.no_labels,
        ..GridOptions::default()
    };

    let overlay = compute_grid(&converter, &view, &opts)?;
    let doc = render_svg(&overlay, args.width, args.height);
    svg::save(&args.out, &doc).with_context(|| format!("writing {}", args.out))?;

    Ok(())
}
